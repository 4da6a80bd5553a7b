//! Cart Summary
//!
//! Renders the read model as a console table.

use std::io;

use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    items::LineItem,
    observer::CartView,
    pricing::{PricingError, format_money, to_money},
};

/// Errors that can occur when rendering a cart summary.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// A price could not be converted to money.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Writes the cart as a table followed by its totals.
///
/// # Errors
///
/// Returns an error if a price cannot be formatted or the output cannot be written.
pub fn write_to(mut out: impl io::Write, view: &CartView<'_>) -> Result<(), SummaryError> {
    if view.is_empty() {
        writeln!(out, "\nCart for {} is empty.", view.scope)?;
        writeln!(out, " Total: {}", view.grand_total)?;

        return Ok(());
    }

    let mut builder = Builder::default();

    builder.push_record(["", "Product", "Description", "Unit Price", "Qty", "Line Total"]);

    for (idx, item) in view.items.iter().enumerate() {
        builder.push_record(item_row(idx, item)?);
    }

    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(
        1,
        HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
    );

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(3..6), Alignment::right());

    writeln!(out, "\n{table}")?;
    writeln!(
        out,
        " Account: {}  Products: {}  Units: {}",
        view.scope,
        view.len(),
        view.unit_count()
    )?;
    writeln!(out, " \x1b[1mTotal:\x1b[0m {}", view.grand_total)?;

    Ok(())
}

fn item_row(idx: usize, item: &LineItem) -> Result<[String; 6], SummaryError> {
    let description = item.display().description.clone().unwrap_or_default();

    Ok([
        format!("#{}", idx + 1),
        item.product_id().to_string(),
        description,
        format_money(&to_money(item.unit_price())?),
        item.quantity().to_string(),
        format_money(&item.line_total_money()?),
    ])
}
