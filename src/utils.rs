//! Report formatting and file output for planning runs.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::solution::{DeliveryRecord, RegionVehicleSummary};
use crate::Plan;

/// Format a duration as hours, minutes, and seconds.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}h {:02}m {:02}s", hours, minutes, seconds)
}

/// Write the output table as CSV with a header row.
pub fn write_records<P: AsRef<Path>>(records: &[DeliveryRecord], path: P) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read an output table written by [`write_records`].
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<DeliveryRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

/// Save a plan as a human-readable text report.
pub fn save_plan<P: AsRef<Path>>(plan: &Plan, path: P) -> Result<()> {
    let mut file = File::create(path)?;

    writeln!(file, "Delivery plan")?;
    writeln!(file, "{}", plan.statistics().format())?;
    writeln!(file)?;

    for (region, region_route) in &plan.routes {
        write!(file, "Region {}: ", region)?;

        if region_route.order_ids.is_empty() {
            writeln!(file, "Empty")?;
            continue;
        }

        writeln!(file, "{}", region_route.order_ids.join(" -> "))?;
        writeln!(file, "  Path distance: {:.2}", region_route.route.path_distance)?;
        writeln!(file, "  Closed tour distance: {:.2}", region_route.route.tour_distance)?;
    }
    writeln!(file)?;

    for load in &plan.allocation.loads {
        writeln!(
            file,
            "Load #{} on {}: {} orders, weight {:.2} / {:.2}, boxes {:.0} / {:.0}{}",
            load.id,
            load.vehicle_id,
            load.order_ids.len(),
            load.weight,
            load.weight_capacity,
            load.boxes,
            load.box_capacity,
            if load.valid { "" } else { " (over capacity)" }
        )?;
    }

    if !plan.allocation.unassigned.is_empty() {
        writeln!(file)?;
        writeln!(file, "Unassigned: {}", plan.allocation.unassigned.join(", "))?;
    }

    Ok(())
}

/// Headline numbers of a planning run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanStatistics {
    pub orders: usize,
    pub regions: usize,
    pub unclustered: usize,
    pub loads: usize,
    pub allocated: usize,
    pub allocation_rate: f64,
    pub capacity_violations: usize,
    pub total_distance: f64,
    pub runtime: Duration,
}

impl PlanStatistics {
    /// Format the statistics as a string.
    pub fn format(&self) -> String {
        format!(
            "Plan Statistics:
- Orders: {}
- Regions: {}
- Unclustered Orders: {}
- Loads: {}
- Allocated Orders: {} ({:.2}%)
- Capacity Violations: {}
- Total Distance: {:.2}
- Runtime: {}",
            self.orders,
            self.regions,
            self.unclustered,
            self.loads,
            self.allocated,
            self.allocation_rate,
            self.capacity_violations,
            self.total_distance,
            format_duration(self.runtime)
        )
    }
}

/// Render the per-region, per-vehicle aggregation as a text table.
pub fn format_summaries(summaries: &[RegionVehicleSummary]) -> String {
    let mut table = format!(
        "{:<12} {:<12} {:>8} {:>12} {:>8}\n",
        "Region", "Vehicle", "Orders", "Weight", "Boxes"
    );

    for summary in summaries {
        let region = summary
            .region
            .map(|region| region.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.push_str(&format!(
            "{:<12} {:<12} {:>8} {:>12.2} {:>8}\n",
            region, summary.vehicle_id, summary.order_count, summary.total_weight, summary.total_boxes
        ));
    }

    table
}
