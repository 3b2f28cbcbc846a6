use crate::api::DicomRecord;
use crate::layout::{used_dose_folder, used_folder, SortedFolder};
use crate::selection::ScanCheck;
use crate::session::{SessionReport, SessionStatus};
use crate::types::DoseClass;
use std::fmt;
use std::path::PathBuf;

/// Text report formatter for one resolved session
pub struct TextReport<'a> {
    report: &'a SessionReport,
}

impl<'a> TextReport<'a> {
    /// Creates a new text report
    pub fn new(report: &'a SessionReport) -> Self {
        Self { report }
    }
}

/// Writes `path -> folder` for a used record
fn write_used(f: &mut fmt::Formatter<'_>, record: &DicomRecord, folder: Option<PathBuf>) -> fmt::Result {
    write!(f, "{}", record.path.display())?;
    if let Some(folder) = folder {
        write!(f, " -> {}", folder.display())?;
    }
    writeln!(f)
}

impl<'a> fmt::Display for TextReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let session = &self.report.session;
        let title = format!("Session {}", session.id);
        writeln!(f, "{}", title)?;
        writeln!(f, "{}", "=".repeat(title.len()))?;
        writeln!(f)?;
        writeln!(f, "State:          {}", session.state)?;

        write!(f, "Plan:           ")?;
        match &session.plan {
            Some(plan) => {
                write_used(f, plan, used_folder(plan))?;
                writeln!(f, "  Planned:      {}", plan.plan_timestamp())?;
                if let Some(label) = &plan.rt_plan_label {
                    writeln!(f, "  Label:        {}", label)?;
                }
            }
            None => writeln!(f, "not found")?,
        }
        for rejected in &session.rejected_plans {
            writeln!(f, "  Rejected:     {} ({})", rejected.record.path.display(), rejected.reason)?;
        }
        if !session.radiation_types.is_empty() {
            let groups: Vec<String> = session
                .radiation_types
                .iter()
                .map(|(radiation, count)| format!("{} ({})", radiation, count))
                .collect();
            writeln!(f, "Radiation:      {}", groups.join(", "))?;
        }

        write!(f, "Structure Set:  ")?;
        match &session.structure_set {
            Some(structure) => write_used(f, structure, used_folder(structure))?,
            None => writeln!(f, "not found")?,
        }
        write!(f, "CT Series:      ")?;
        match &session.ct_series {
            Some(ct) => write_used(f, ct, used_folder(ct))?,
            None => writeln!(f, "not found")?,
        }
        if !session.other_structure_sets.is_empty() || !session.other_ct_series.is_empty() {
            writeln!(
                f,
                "Other:          {} structure set(s), {} CT series",
                session.other_structure_sets.len(),
                session.other_ct_series.len()
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Doses")?;
        writeln!(f, "-----")?;
        if session.doses.is_empty() {
            writeln!(f, "none")?;
        }
        for class in DoseClass::ALL {
            for dose in session.doses.doses.iter().filter(|d| d.class == class) {
                write!(f, "{:<18}", format!("{}:", class))?;
                if dose.used {
                    write_used(f, &dose.record, used_dose_folder(dose.class))?;
                } else {
                    let note = if dose.codec_failure {
                        " (codec failure)"
                    } else if dose.referenced {
                        " (referenced)"
                    } else {
                        ""
                    };
                    writeln!(f, "{}{}", dose.record.path.display(), note)?;
                }
            }
        }
        if let Some(reference) = session.reference_dose() {
            writeln!(f, "Reference Dose:   {}", reference.path.display())?;
        }

        if !self.report.side_effects.is_empty() {
            writeln!(f)?;
            writeln!(f, "Rewritten Inputs")?;
            writeln!(f, "----------------")?;
            for effect in &self.report.side_effects {
                writeln!(f, "{}: {}", effect.kind.simple_name(), effect.path.display())?;
            }
        }

        if !self.report.diagnostics.is_empty() {
            writeln!(f)?;
            writeln!(f, "Diagnostics")?;
            writeln!(f, "-----------")?;
            for diagnostic in &self.report.diagnostics {
                writeln!(f, "{}", diagnostic)?;
            }
        }

        writeln!(f)?;
        match &self.report.status {
            SessionStatus::Written(summary) => writeln!(
                f,
                "Written:        {} ({} used, {} other)",
                summary.session_dir.display(),
                summary.used.len(),
                summary.other.len()
            ),
            SessionStatus::Failed { error } => writeln!(f, "Failed:         {}", error),
        }
    }
}

/// Text report formatter for a checked scan folder
pub struct ScanReport<'a> {
    check: &'a ScanCheck,
}

impl<'a> ScanReport<'a> {
    pub fn new(check: &'a ScanCheck) -> Self {
        Self { check }
    }
}

impl<'a> fmt::Display for ScanReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scan Check: {}", self.check.scan_dir.display())?;
        writeln!(f)?;
        writeln!(f, "Kept:           {}", self.check.selection.kept.len())?;
        writeln!(f, "Dropped:        {}", self.check.selection.dropped.len())?;
        for dropped in &self.check.selection.dropped {
            writeln!(f, "  {}: {}", dropped.reason, dropped.record.path.display())?;
        }
        if !self.check.side_effects.is_empty() {
            writeln!(f, "Decompressed:   {}", self.check.side_effects.len())?;
        }
        writeln!(
            f,
            "Copied:         {} file(s) to {}",
            self.check.copied.len(),
            self.check.output_dir.display()
        )
    }
}

/// Text report formatter for a sorted export
pub struct SortReport<'a> {
    sorted: &'a [SortedFolder],
}

impl<'a> SortReport<'a> {
    pub fn new(sorted: &'a [SortedFolder]) -> Self {
        Self { sorted }
    }
}

impl<'a> fmt::Display for SortReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sorted {} folder(s)", self.sorted.len())?;
        for folder in self.sorted {
            writeln!(
                f,
                "{:<9}{} -> {}",
                folder.modality,
                folder.source.display(),
                folder.target.display()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Diagnostic, DiagnosticKind};
    use crate::layout::LayoutSummary;
    use crate::selection::{ClassifiedDose, DosePartition, SeriesSelection};
    use crate::session::{Session, SessionId, SessionState};
    use crate::testing::bare_record;
    use crate::types::Modality;

    fn dose(path: &str, class: DoseClass, used: bool) -> ClassifiedDose {
        let mut record = bare_record(path, path, Modality::RtDose);
        record.has_grid_frame_offset_vector = true;
        ClassifiedDose {
            record,
            class,
            referenced: used,
            used,
            codec_failure: false,
        }
    }

    fn report() -> SessionReport {
        let mut session = Session::new(SessionId::new("P001", "T0"), "in/P001/T0");
        let mut plan = bare_record("in/P001/T0/RTPLAN/1-plan/P1.dcm", "P1", Modality::RtPlan);
        plan.rt_plan_date = Some("20200101".into());
        plan.rt_plan_label = Some("Prostate".into());
        session.plan = Some(plan);
        session.radiation_types.insert("PHOTON".into(), 1);
        session.doses = DosePartition {
            doses: vec![
                dose("in/P001/T0/RTDOSE/1-d/RD.dcm", DoseClass::Physical, true),
                dose("in/P001/T0/RTDOSE/2-d/RD.dcm", DoseClass::Unclassified, false),
            ],
        };
        session.advance(SessionState::Written);

        SessionReport {
            session,
            side_effects: Vec::new(),
            diagnostics: vec![Diagnostic {
                kind: DiagnosticKind::MissingLink,
                message: "RTPLAN references no RTSTRUCT".into(),
                path: None,
            }],
            status: SessionStatus::Written(LayoutSummary {
                session_dir: PathBuf::from("out/P001/T0"),
                used: vec![PathBuf::from("out/P001/T0/RTPLAN/1-RTPLAN_Used/P1.dcm")],
                other: Vec::new(),
            }),
        }
    }

    #[test]
    fn test_text_report_format() {
        let report = report();
        let output = TextReport::new(&report).to_string();

        assert!(output.starts_with("Session P001/T0\n===============\n"));
        assert!(output.contains("State:          written"));
        assert!(output.contains("P1.dcm -> RTPLAN/1-RTPLAN_Used"));
        assert!(output.contains("  Label:        Prostate"));
        assert!(output.contains("Radiation:      PHOTON (1)"));
        assert!(output.contains("Structure Set:  not found"));
        assert!(output.contains("RTDOSE/1-d/RD.dcm -> RTDOSE/1-PHYSICAL_Used"));
        assert!(output.contains("Reference Dose:   in/P001/T0/RTDOSE/1-d/RD.dcm"));
        assert!(output.contains("[missing-link] RTPLAN references no RTSTRUCT"));
        assert!(output.contains("Written:        out/P001/T0 (1 used, 0 other)"));
    }

    #[test]
    fn test_failed_session() {
        let mut report = report();
        report.status = SessionStatus::Failed {
            error: "permission denied".into(),
        };
        let output = TextReport::new(&report).to_string();
        assert!(output.contains("Failed:         permission denied"));
    }

    #[test]
    fn test_scan_report() {
        let check = ScanCheck {
            scan_dir: PathBuf::from("scan"),
            output_dir: PathBuf::from("out"),
            selection: SeriesSelection::default(),
            copied: Vec::new(),
            side_effects: Vec::new(),
        };
        let output = ScanReport::new(&check).to_string();
        assert!(output.contains("Scan Check: scan"));
        assert!(output.contains("Copied:         0 file(s) to out"));
    }

    #[test]
    fn test_sort_report() {
        let sorted = vec![SortedFolder {
            source: PathBuf::from("raw/P/T/1-plan-1"),
            target: PathBuf::from("in/P/T/RTPLAN/1"),
            modality: "RTPLAN".into(),
        }];
        let output = SortReport::new(&sorted).to_string();
        assert!(output.contains("Sorted 1 folder(s)"));
        assert!(output.contains("RTPLAN   raw/P/T/1-plan-1 -> in/P/T/RTPLAN/1"));
    }
}
