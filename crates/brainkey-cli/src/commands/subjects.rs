//! The `brainkey subjects` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use brainkey_core::model::Subject;
use brainkey_providers::prompt::question_mix;

pub fn execute() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["#", "Subject", "Quiz", "Typing"]);

    for (n, subject) in Subject::ALL.iter().enumerate() {
        let mix = question_mix(*subject);
        table.add_row(vec![
            Cell::new(n + 1),
            Cell::new(subject),
            Cell::new(mix.quiz),
            Cell::new(mix.typing),
        ]);
    }

    println!("{table}");
    Ok(())
}
