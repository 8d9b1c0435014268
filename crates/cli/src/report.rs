//! Text and JSON reporting.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tqec_pack_core::{CompactionResult, CompactionSummary};
use tqec_pack_layout::{Loop, Module};

/// Writes every loop followed by the module built from it.
pub fn write_inspection<W: Write>(out: &mut W, loops: &[Loop], modules: &[Module]) -> io::Result<()> {
    for l in loops {
        writeln!(out, "{}", l)?;
    }
    writeln!(out)?;
    for m in modules {
        writeln!(out, "{}", m)?;
        writeln!(
            out,
            "nodes: {} frame, {} cross; edges: {} frame, {} cross, {} injector",
            m.frame_nodes().len(),
            m.cross_nodes().len(),
            m.frame_edges().len(),
            m.cross_edges().len(),
            m.injector_edges().count()
        )?;
    }
    Ok(())
}

/// Writes the compaction summary and the final placement table.
pub fn write_summary<W: Write>(out: &mut W, result: &CompactionResult) -> io::Result<()> {
    let summary = CompactionSummary::from(result);

    writeln!(out)?;
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out, "Compaction Summary")?;
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out, "Stages:       {}", result.stages.join(" -> "))?;
    writeln!(out, "Modules:      {} ({} rotated)", summary.modules, summary.rotated)?;
    writeln!(
        out,
        "Cost:         {:.2} -> {:.2} ({:.1}% better)",
        summary.initial_cost, summary.final_cost, summary.improvement_percent
    )?;
    writeln!(
        out,
        "Extents:      {} x {} x {}",
        summary.extents[0], summary.extents[1], summary.extents[2]
    )?;
    writeln!(out, "Density:      {:.1}%", summary.density_percent)?;
    writeln!(
        out,
        "Trials:       {} ({} accepted, {} rejected, {} invalid)",
        summary.iterations, result.accepted, result.rejected, result.invalid
    )?;
    writeln!(out, "Time:         {} ms", summary.time_ms)?;
    if result.cancelled {
        writeln!(out, "Stopped early by cancellation")?;
    }

    writeln!(out, "{}", "-".repeat(60))?;
    writeln!(
        out,
        "{:<8} {:>8} {:>8} {:>8}   {:<12} {}",
        "module", "x", "y", "z", "size", "turns"
    )?;
    for p in &result.placements {
        writeln!(
            out,
            "{:<8} {:>8} {:>8} {:>8}   {:<12} {}",
            p.module_id,
            p.position.x,
            p.position.y,
            p.position.z,
            format!("{}x{}x{}", p.size.x, p.size.y, p.size.z),
            p.rotation
        )?;
    }
    Ok(())
}

/// Saves the result as pretty-printed JSON.
pub fn save_json(result: &CompactionResult, path: impl AsRef<Path>) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, result)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tqec_pack_core::{Point3, Placement, StageReport, Vector3};
    use tqec_pack_layout::{LoopType, ModuleFactory};

    fn sample_result() -> CompactionResult {
        let mut result = CompactionResult::new();
        let mut report = StageReport::new("relocation");
        report.initial_cost = Some(10.0);
        report.final_cost = Some(8.0);
        result.record_stage(report);
        result.placements.push(Placement::new(
            3,
            Point3::new(0.0, 0.0, 0.0),
            Vector3::new(2.0, 4.0, 6.0),
        ));
        result
    }

    #[test]
    fn test_summary_text() {
        let mut out = Vec::new();
        write_summary(&mut out, &sample_result()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Compaction Summary"));
        assert!(text.contains("10.00 -> 8.00 (20.0% better)"));
        assert!(text.contains("2x4x6"));
    }

    #[test]
    fn test_inspection_text() {
        let source = Loop::new(0, LoopType::Primal).with_pins(2);
        let module = ModuleFactory::new().create(&source);
        let mut out = Vec::new();
        write_inspection(&mut out, &[source], &[module]).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("--- loop 0 ---"));
        assert!(text.contains("--- 0 ---"));
        assert!(text.contains("1 injector"));
    }

    #[test]
    fn test_save_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");
        save_json(&sample_result(), &path).unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        let back: CompactionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.placements, sample_result().placements);
        assert_eq!(back.stages, vec!["relocation"]);
    }
}
