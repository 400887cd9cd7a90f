use crate::core::format::{format_long_date, format_money, format_number};
use crate::models::{InvoiceData, InvoiceTotals};

#[derive(Debug, Clone)]
pub struct ComposeOptions {
    pub currency_prefix: String,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        ComposeOptions {
            currency_prefix: "Rs.".to_string(),
        }
    }
}

/// Secuencia ordenada de bloques autocontenidos. Cada bloque lleva sus
/// cadenas de presentación ya formateadas, de modo que los dos pipelines de
/// exportación no pueden divergir en formato. Los valores ausentes se
/// convierten en cadena vacía; "undefined" o "null" no aparecen jamás.
#[derive(Debug, Clone)]
pub struct ComposedInvoice {
    pub invoice_number: String,
    pub blocks: Vec<LayoutBlock>,
}

#[derive(Debug, Clone)]
pub enum LayoutBlock {
    Header(HeaderBlock),
    Addresses(AddressBlock),
    ItemTable(ItemTableBlock),
    Totals(TotalsBlock),
    Notes(NotesBlock),
}

#[derive(Debug, Clone)]
pub struct HeaderBlock {
    pub title: String,
    pub invoice_number: String,
    pub issue_line: String,
    pub due_line: String,
    pub logo: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Party {
    pub heading: String,
    pub name: String,
    pub email: String,
    pub address_lines: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AddressBlock {
    pub from: Party,
    pub to: Party,
}

#[derive(Debug, Clone)]
pub struct ItemRow {
    pub name: String,
    pub description: String,
    pub quantity: String,
    pub rate: String,
    pub amount: String,
}

#[derive(Debug, Clone)]
pub struct ItemTableBlock {
    pub headers: Vec<String>,
    pub rows: Vec<ItemRow>,
}

#[derive(Debug, Clone)]
pub struct TotalsRow {
    pub label: String,
    pub value: String,
    pub emphasis: bool,
}

#[derive(Debug, Clone)]
pub struct TotalsBlock {
    pub rows: Vec<TotalsRow>,
}

#[derive(Debug, Clone)]
pub struct NotesBlock {
    pub heading: String,
    pub lines: Vec<String>,
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(|line| line.trim_end().to_string()).collect()
}

/// Transformación pura (datos + resumen) → bloques. Las filas de descuento e
/// impuesto se omiten estructuralmente cuando su tasa es 0: cambia la forma
/// de la salida, no solo su representación.
pub fn compose(
    data: &InvoiceData,
    totals: &InvoiceTotals,
    options: &ComposeOptions,
) -> ComposedInvoice {
    let prefix = options.currency_prefix.as_str();
    let mut blocks = Vec::with_capacity(5);

    blocks.push(LayoutBlock::Header(HeaderBlock {
        title: "INVOICE".to_string(),
        invoice_number: data.invoice_number.clone(),
        issue_line: format!("Issue Date: {}", format_long_date(data.invoice_date)),
        due_line: format!("Due Date: {}", format_long_date(data.due_date)),
        logo: data.logo.clone(),
    }));

    blocks.push(LayoutBlock::Addresses(AddressBlock {
        from: Party {
            heading: "From".to_string(),
            name: data.from_name.clone(),
            email: data.from_email.clone(),
            address_lines: split_lines(&data.from_address),
        },
        to: Party {
            heading: "Bill To".to_string(),
            name: data.to_name.clone(),
            email: data.to_email.clone(),
            address_lines: split_lines(&data.to_address),
        },
    }));

    let rows = data
        .items
        .iter()
        .map(|item| ItemRow {
            name: item.name.clone(),
            description: item.description.clone().unwrap_or_default(),
            quantity: item.quantity.map(format_number).unwrap_or_default(),
            rate: item.rate.map(|rate| format_money(rate, prefix)).unwrap_or_default(),
            amount: format_money(item.amount(), prefix),
        })
        .collect();

    blocks.push(LayoutBlock::ItemTable(ItemTableBlock {
        headers: vec![
            "Item".to_string(),
            "Quantity".to_string(),
            "Rate".to_string(),
            "Amount".to_string(),
        ],
        rows,
    }));

    let mut totals_rows = vec![TotalsRow {
        label: "Subtotal:".to_string(),
        value: format_money(totals.subtotal, prefix),
        emphasis: false,
    }];

    let discount = data.discount.unwrap_or(0.0);
    if discount > 0.0 {
        totals_rows.push(TotalsRow {
            label: format!("Discount ({}%):", format_number(discount)),
            value: format!("- {}", format_money(totals.discount_amount, prefix)),
            emphasis: false,
        });
    }

    totals_rows.push(TotalsRow {
        label: "Net Price:".to_string(),
        value: format_money(totals.net_price, prefix),
        emphasis: false,
    });

    let tax_rate = data.tax_rate.unwrap_or(0.0);
    if tax_rate > 0.0 {
        totals_rows.push(TotalsRow {
            label: format!("Tax ({}%):", format_number(tax_rate)),
            value: format!("+ {}", format_money(totals.tax_amount, prefix)),
            emphasis: false,
        });
    }

    totals_rows.push(TotalsRow {
        label: "Total:".to_string(),
        value: format_money(totals.total, prefix),
        emphasis: true,
    });

    blocks.push(LayoutBlock::Totals(TotalsBlock { rows: totals_rows }));

    if let Some(notes) = &data.notes {
        if !notes.trim().is_empty() {
            blocks.push(LayoutBlock::Notes(NotesBlock {
                heading: "Notes".to_string(),
                lines: split_lines(notes),
            }));
        }
    }

    ComposedInvoice {
        invoice_number: data.invoice_number.clone(),
        blocks,
    }
}
