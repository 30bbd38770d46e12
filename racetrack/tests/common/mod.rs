use std::sync::Arc;

use racetrack::resources::classic_track_file;
use racetrack::track::TrackGeometry;

/// 40×40 box with the vehicle in the middle, heading north; the finish zone covers the start
pub const START_IN_FINISH_TRACK: &str = "0,0,90\n-10,10\n10,-10\n-20,-20\n20,-20\n20,20\n-20,20";

pub fn track(definition: &str) -> Arc<TrackGeometry> {
    Arc::new(definition.parse().unwrap())
}

pub fn classic_track() -> Arc<TrackGeometry> {
    Arc::new(TrackGeometry::load(&classic_track_file()).unwrap())
}
