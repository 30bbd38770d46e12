use num_format::{CustomFormat, Grouping, ToFormattedString};

pub fn number_format() -> CustomFormat {
    CustomFormat::builder()
        .grouping(Grouping::Standard)
        .minus_sign("-")
        .separator("_")
        .build()
        .expect("static number format")
}

/// `12345` -> `"12_345"`
pub fn count(value: usize) -> String {
    value.to_formatted_string(&number_format())
}
