use super::{compare::status_line, ui};
use crate::core::{Currency, RateStore, SyncStatus, rank_rates};
use anyhow::{Result, bail};
use comfy_table::{Attribute, Cell, CellAlignment, Color};

/// Prints today's advertised rates for `currency`, lowest first.
pub fn run(store: &RateStore, currency: Currency, status: SyncStatus) -> Result<()> {
    if currency.is_settlement() {
        bail!("Rates are quoted for EUR or USD, not {}", currency);
    }

    let quotes = rank_rates(&store.snapshot(), currency);

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Provider"),
        ui::header_cell("Country"),
        ui::header_cell(&format!("1 {currency} in XOF")),
    ]);

    for quote in &quotes {
        let rate_cell = Cell::new(quote.display_rate).set_alignment(CellAlignment::Right);
        let (name, rate_cell) = if quote.is_best {
            (
                Cell::new(format!("{} (best rate)", quote.provider.name))
                    .fg(Color::Green)
                    .add_attribute(Attribute::Bold),
                rate_cell.fg(Color::Green).add_attribute(Attribute::Bold),
            )
        } else {
            (Cell::new(quote.provider.name), rate_cell)
        };
        table.add_row(vec![name, Cell::new(quote.provider.country), rate_cell]);
    }

    println!(
        "{}\n\n{table}\n\n{}",
        ui::style_text(&format!("Today's {currency} rates"), ui::StyleType::Title),
        status_line(status)
    );
    Ok(())
}
