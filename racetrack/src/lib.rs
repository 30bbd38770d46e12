pub mod algebra_2d;
pub mod error;
pub mod lease;
pub mod learn;
pub mod observer;
pub mod resources;
pub mod reward;
pub mod track;
pub mod vehicle;

#[cfg(test)]
#[ctor::ctor]
fn init() {
    ql::util::init_logging();
}
