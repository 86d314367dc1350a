//! `droidenv steps`: list step ids in run order.

use comfy_table::{Table, presets};

use crate::StepId;
use crate::ui::theme::format_duration;

pub fn steps() {
    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_header(vec!["#", "ID", "STEP", "ESTIMATE"]);
    for (i, id) in StepId::ALL.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            id.as_str().to_string(),
            id.name().to_string(),
            format!("~{}", format_duration(id.estimate_secs() as f64)),
        ]);
    }
    println!("{table}");

    let total: u64 = StepId::ALL.into_iter().map(StepId::estimate_secs).sum();
    println!();
    println!("Estimated total: {}", format_duration(total as f64));
}
