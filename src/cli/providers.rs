use super::ui;
use crate::core::rates::default_fee;
use crate::core::{CountryFilter, list_providers};
use comfy_table::Cell;

/// Lists the known providers, optionally restricted to one country.
pub fn run(filter: CountryFilter) {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Id"),
        ui::header_cell("Name"),
        ui::header_cell("Country"),
        ui::header_cell("Built-in fee"),
    ]);

    for provider in list_providers().iter().filter(|p| filter.matches(p)) {
        table.add_row(vec![
            Cell::new(provider.id),
            Cell::new(provider.name),
            Cell::new(provider.country),
            ui::amount_cell(
                default_fee(provider.id).amount(),
                ui::NOT_SPECIFIED,
                ui::format_xof,
            ),
        ]);
    }

    println!("{table}");
}
