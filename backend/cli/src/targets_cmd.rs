//! `fiberlens targets`: list page targets exposed by the DevTools endpoint.

use anyhow::Result;

use fiberlens_browser::{list_page_targets, TargetInfo};
use fiberlens_config::FiberlensConfig;

use crate::terminal_output::{note_warn, render_table, supports_color, Column};

pub async fn run(config: &FiberlensConfig) -> Result<()> {
    let client = reqwest::Client::new();
    let targets = list_page_targets(&client, &config.browser.endpoint).await?;

    if targets.is_empty() {
        note_warn("No page targets found. Is the browser running with --remote-debugging-port?");
        return Ok(());
    }
    print!("{}", render_targets(&targets, supports_color()));
    Ok(())
}

fn render_targets(targets: &[TargetInfo], color: bool) -> String {
    let columns = [
        Column::new("Id"),
        Column::new("Title").max_width(40),
        Column::new("Url").max_width(60),
    ];
    let rows: Vec<Vec<String>> = targets
        .iter()
        .map(|t| vec![t.id.clone(), t.title.clone(), t.url.clone()])
        .collect();
    render_table(&columns, &rows, color)
}
