/// Configuration for resolving RT sessions
///
/// # Example
///
/// ```
/// use rtcurate_core::ResolverConfig;
///
/// let config = ResolverConfig::default()
///     .with_decompress_command(["dcmdjpeg"])
///     .sanitize_roi_names(false);
///
/// assert_eq!(config.decompress_command, vec!["dcmdjpeg".to_string()]);
/// assert!(!config.sanitize_roi_names);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolverConfig {
    /// External decompression program and its leading arguments
    ///
    /// Invoked as `<program> <args...> <file> <file>`, rewriting the file in place.
    pub decompress_command: Vec<String>,

    /// Strip non-alphabetic characters from ROI names of the selected structure set
    pub sanitize_roi_names: bool,

    /// Treat doses pointing back at the plan as referenced when the plan lists none
    pub dose_back_references: bool,

    /// ApprovalStatus a plan must carry (absent counts as matching)
    pub required_approval: String,

    /// PlanIntent a plan must carry (absent counts as matching)
    pub required_intent: String,

    /// Resolve sessions in parallel
    pub parallel: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            decompress_command: vec!["gdcmconv".to_string(), "--raw".to_string()],
            sanitize_roi_names: true,
            dose_back_references: false,
            required_approval: "APPROVED".to_string(),
            required_intent: "CURATIVE".to_string(),
            parallel: false,
        }
    }
}

impl ResolverConfig {
    /// Creates a config that never mutates input files and accepts every plan
    ///
    /// Plans are still ordered by recency.
    ///
    /// # Example
    ///
    /// ```
    /// use rtcurate_core::ResolverConfig;
    ///
    /// let permissive = ResolverConfig::permissive();
    /// assert!(!permissive.sanitize_roi_names);
    /// assert!(permissive.required_approval.is_empty());
    /// ```
    pub fn permissive() -> Self {
        Self {
            sanitize_roi_names: false,
            dose_back_references: true,
            required_approval: String::new(),
            required_intent: String::new(),
            ..Self::default()
        }
    }

    /// Builder: Set the external decompression command
    pub fn with_decompress_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.decompress_command = command.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: Enable or disable ROI name sanitisation
    pub fn sanitize_roi_names(mut self, sanitize: bool) -> Self {
        self.sanitize_roi_names = sanitize;
        self
    }

    /// Builder: Follow dose → plan back references
    ///
    /// # Example
    ///
    /// ```
    /// use rtcurate_core::ResolverConfig;
    ///
    /// let config = ResolverConfig::default().dose_back_references(true);
    /// assert!(config.dose_back_references);
    /// ```
    pub fn dose_back_references(mut self, follow: bool) -> Self {
        self.dose_back_references = follow;
        self
    }

    /// Builder: Required ApprovalStatus; empty accepts any
    pub fn with_required_approval(mut self, status: impl Into<String>) -> Self {
        self.required_approval = status.into();
        self
    }

    /// Builder: Required PlanIntent; empty accepts any
    pub fn with_required_intent(mut self, intent: impl Into<String>) -> Self {
        self.required_intent = intent.into();
        self
    }

    /// Builder: Resolve sessions on the rayon pool
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}
