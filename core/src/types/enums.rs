use std::fmt;

/// SOP Class UIDs used to infer the modality when the Modality tag is absent
pub const RT_DOSE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.481.2";
pub const RT_STRUCTURE_SET_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.481.3";
pub const RT_PLAN_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.481.5";
pub const RT_ION_PLAN_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.481.8";
pub const CT_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.2";
pub const MR_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.4";

/// Modality of a DICOM object, as far as the resolver cares
///
/// The folder names of the session input layout are the DICOM modality
/// strings (`RTPLAN`, `RTSTRUCT`, `RTDOSE`, `CT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "UPPERCASE"))]
pub enum Modality {
    RtPlan,
    RtStruct,
    RtDose,
    Ct,
    Mr,
    Other,
}

impl Modality {
    /// The modalities that make up a treatment record, in resolution order
    pub const TREATMENT: [Modality; 4] = [
        Modality::RtPlan,
        Modality::RtStruct,
        Modality::Ct,
        Modality::RtDose,
    ];

    /// Returns the DICOM modality string (also the input folder name)
    pub fn dicom_name(&self) -> &'static str {
        match self {
            Modality::RtPlan => "RTPLAN",
            Modality::RtStruct => "RTSTRUCT",
            Modality::RtDose => "RTDOSE",
            Modality::Ct => "CT",
            Modality::Mr => "MR",
            Modality::Other => "OTHER",
        }
    }

    /// Returns whether this is an RT object (plan, structure set or dose)
    pub fn is_rt_object(&self) -> bool {
        matches!(self, Modality::RtPlan | Modality::RtStruct | Modality::RtDose)
    }

    /// Returns whether this is a cross-sectional image modality
    pub fn is_image(&self) -> bool {
        matches!(self, Modality::Ct | Modality::Mr)
    }

    /// Parses the Modality tag value
    ///
    /// `RTSS` is a legacy alias for `RTSTRUCT`.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "RTPLAN" => Modality::RtPlan,
            "RTSTRUCT" | "RTSS" => Modality::RtStruct,
            "RTDOSE" => Modality::RtDose,
            "CT" => Modality::Ct,
            "MR" => Modality::Mr,
            _ => Modality::Other,
        }
    }

    /// Infers the modality from a SOP Class UID
    pub fn from_sop_class(uid: &str) -> Option<Self> {
        match uid.trim_end_matches('\0') {
            RT_PLAN_STORAGE | RT_ION_PLAN_STORAGE => Some(Modality::RtPlan),
            RT_STRUCTURE_SET_STORAGE => Some(Modality::RtStruct),
            RT_DOSE_STORAGE => Some(Modality::RtDose),
            CT_IMAGE_STORAGE => Some(Modality::Ct),
            MR_IMAGE_STORAGE => Some(Modality::Mr),
            _ => None,
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dicom_name())
    }
}

/// RT Dose DoseType (3004,0004)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "lowercase"))]
pub enum DoseType {
    Physical,
    Effective,
    Error,
    Unknown,
}

impl DoseType {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "PHYSICAL" => DoseType::Physical,
            "EFFECTIVE" => DoseType::Effective,
            "ERROR" => DoseType::Error,
            _ => DoseType::Unknown,
        }
    }
}

/// RT Dose DoseSummationType (3004,000A)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum DoseSummationType {
    Plan,
    MultiPlan,
    Fraction,
    Beam,
    Other,
}

impl DoseSummationType {
    /// Returns whether the dose covers a whole plan (PLAN, MULTI_PLAN, ...)
    pub fn is_plan_level(&self) -> bool {
        matches!(self, DoseSummationType::Plan | DoseSummationType::MultiPlan)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        let s_upper = s.trim().to_uppercase();
        match s_upper.as_str() {
            "PLAN" => DoseSummationType::Plan,
            "MULTI_PLAN" => DoseSummationType::MultiPlan,
            "FRACTION" => DoseSummationType::Fraction,
            "BEAM" => DoseSummationType::Beam,
            // PLAN_SUM and other vendor variants are still plan-level
            _ if s_upper.contains("PLAN") => DoseSummationType::Plan,
            _ => DoseSummationType::Other,
        }
    }
}

/// Clinical classification of a dose cube
///
/// Declaration order is the preference order for the reference dose:
/// physical before RBE-weighted, plan before fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum DoseClass {
    Physical,
    PhysicalFraction,
    Rbe,
    RbeFraction,
    Unclassified,
}

impl DoseClass {
    /// Every class, in preference order
    pub const ALL: [DoseClass; 5] = [
        DoseClass::Physical,
        DoseClass::PhysicalFraction,
        DoseClass::Rbe,
        DoseClass::RbeFraction,
        DoseClass::Unclassified,
    ];

    /// Classifies a dose by its type and summation
    pub fn classify(dose_type: Option<DoseType>, summation: Option<DoseSummationType>) -> Self {
        match (dose_type, summation) {
            (Some(DoseType::Physical), Some(s)) if s.is_plan_level() => DoseClass::Physical,
            (Some(DoseType::Effective), Some(s)) if s.is_plan_level() => DoseClass::Rbe,
            (Some(DoseType::Physical), Some(DoseSummationType::Fraction)) => {
                DoseClass::PhysicalFraction
            }
            (Some(DoseType::Effective), Some(DoseSummationType::Fraction)) => {
                DoseClass::RbeFraction
            }
            _ => DoseClass::Unclassified,
        }
    }

    /// Output folder for a used dose of this class
    ///
    /// Unclassified doses are never used, so they have no folder.
    pub fn used_folder_name(&self) -> Option<&'static str> {
        match self {
            DoseClass::Physical => Some("1-PHYSICAL_Used"),
            DoseClass::PhysicalFraction => Some("1-PHYSICALFRACTION_Used"),
            DoseClass::Rbe => Some("1-RBE_Used"),
            DoseClass::RbeFraction => Some("1-RBEFRACTION_Used"),
            DoseClass::Unclassified => None,
        }
    }

    /// Returns simple name for display
    pub fn simple_name(&self) -> &'static str {
        match self {
            DoseClass::Physical => "physical",
            DoseClass::PhysicalFraction => "physical_fraction",
            DoseClass::Rbe => "rbe",
            DoseClass::RbeFraction => "rbe_fraction",
            DoseClass::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for DoseClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// Why a plan candidate was not selected
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum PlanRejection {
    /// ApprovalStatus present and not the required value
    NotApproved(String),
    /// PlanIntent present and not the required value
    NotCurative(String),
    /// Qualifying, but a more recent plan won
    Superseded,
}

impl fmt::Display for PlanRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanRejection::NotApproved(status) => write!(f, "approval status {}", status),
            PlanRejection::NotCurative(intent) => write!(f, "plan intent {}", intent),
            PlanRejection::Superseded => write!(f, "superseded by a more recent plan"),
        }
    }
}
