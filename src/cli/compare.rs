use super::ui;
use crate::core::{
    ComparisonResult, CountryFilter, Currency, Fee, RateStore, SyncStatus, compare,
};
use anyhow::Result;
use comfy_table::{Attribute, Cell, CellAlignment, Color};

/// What to compare, after defaults from the config have been applied.
#[derive(Debug, Clone, Copy)]
pub struct CompareRequest {
    pub amount: f64,
    pub currency: Currency,
    pub country: CountryFilter,
}

pub fn run(
    store: &RateStore,
    request: &CompareRequest,
    status: SyncStatus,
    json: bool,
) -> Result<()> {
    let results = compare(store, request.amount, request.currency, request.country);

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!("{}", render(request, &results, status));
    Ok(())
}

pub fn render(
    request: &CompareRequest,
    results: &[ComparisonResult],
    status: SyncStatus,
) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Provider"),
        ui::header_cell("Conversion"),
        ui::header_cell("Fee"),
        ui::header_cell("Total charge"),
        ui::header_cell("Rate"),
        ui::header_cell("Extra cost"),
    ]);

    for result in results {
        let provider_cell = if result.is_cheapest {
            Cell::new(format!("{} (best option)", result.provider.name))
                .fg(Color::Green)
                .add_attribute(Attribute::Bold)
        } else {
            Cell::new(result.provider.name)
        };

        let rate = if request.currency.is_settlement() {
            "1:1".to_string()
        } else {
            format!("{} XOF", result.breakdown.display_rate)
        };

        table.add_row(vec![
            Cell::new(result.rank),
            provider_cell,
            Cell::new(ui::format_xof(result.breakdown.total_cost as f64))
                .set_alignment(CellAlignment::Right),
            ui::amount_cell(result.fee.amount(), ui::NOT_SPECIFIED, ui::format_xof),
            ui::amount_cell(result.total_charge.amount(), ui::NOT_SPECIFIED, ui::format_xof),
            Cell::new(rate).set_alignment(CellAlignment::Right),
            ui::savings_cell(result.savings),
        ]);
    }

    let mut output = format!(
        "Sending {} {} ({})\n\n",
        ui::style_text(&request.amount.to_string(), ui::StyleType::Title),
        request.currency,
        country_label(request.country),
    );
    output.push_str(&table.to_string());
    output.push_str("\n\n");
    output.push_str(&status_line(status));

    if results.iter().any(|r| r.fee == Fee::Undisclosed) {
        output.push('\n');
        output.push_str(&ui::style_text(
            "Providers with an unpublished fee are listed last.",
            ui::StyleType::Subtle,
        ));
    }
    output
}

fn country_label(filter: CountryFilter) -> String {
    match filter {
        CountryFilter::All => "all countries".to_string(),
        CountryFilter::Only(region) => format!("providers serving {region}"),
    }
}

/// One-line description of where the rates come from.
pub fn status_line(status: SyncStatus) -> String {
    match status {
        SyncStatus::Live {
            last_updated: Some(ts),
        } => ui::style_text(
            &format!("Live rates, last updated {}", ts.format("%Y-%m-%d %H:%M UTC")),
            ui::StyleType::Subtle,
        ),
        SyncStatus::Live { last_updated: None } => {
            ui::style_text("Live rates", ui::StyleType::Subtle)
        }
        SyncStatus::DefaultsOnly => ui::style_text(
            "Showing built-in rates; live rates are unavailable.",
            ui::StyleType::Error,
        ),
    }
}
