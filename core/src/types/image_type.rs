use std::fmt;

/// Tokens that mark a scout or projection sub-acquisition
pub const LOCALIZER_TOKENS: [&str; 2] = ["PROJECTION IMAGE", "LOCALIZER"];

/// DICOM ImageType field as its ordered list of values
///
/// The first value describes the pixels (e.g. "ORIGINAL", "DERIVED"), the
/// second the exam (e.g. "PRIMARY"); further values are modality specific.
/// Two ImageTypes are equal only when every value matches in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct ImageType {
    values: Vec<String>,
}

impl ImageType {
    /// Creates a new ImageType from its values
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// All values in order
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// First element (e.g. "ORIGINAL", "DERIVED")
    pub fn pixels(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// Second element (e.g. "PRIMARY", "SECONDARY")
    pub fn exam(&self) -> Option<&str> {
        self.values.get(1).map(String::as_str)
    }

    /// Checks if the image type contains a specific value
    pub fn contains(&self, val: &str) -> bool {
        self.values.iter().any(|x| x == val)
    }

    /// Checks if this is a localizer or projection acquisition
    pub fn is_localizer(&self) -> bool {
        LOCALIZER_TOKENS.iter().any(|token| self.contains(token))
    }

    /// Returns a simple string representation
    ///
    /// Format: "value1|value2|..."
    pub fn simple_repr(&self) -> String {
        self.values.join("|")
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_repr())
    }
}
