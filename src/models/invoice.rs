use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::error::{ExportError, ExportResult};

/// Acepta number | string | null. Cualquier valor no numérico o no finito
/// queda en None; el default a 0 ocurre una sola vez, en calculate_totals.
fn loose_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()),
        Some(serde_json::Value::String(s)) => {
            s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "loose_opt_f64")]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "loose_opt_f64")]
    pub rate: Option<f64>,
}

impl InvoiceItem {
    /// Importe de línea: cantidad × tarifa. Siempre derivado, nunca almacenado.
    pub fn amount(&self) -> f64 {
        self.quantity.unwrap_or(0.0) * self.rate.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceData {
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub from_name: String,
    pub from_email: String,
    pub from_address: String,
    pub to_name: String,
    pub to_email: String,
    pub to_address: String,
    pub items: Vec<InvoiceItem>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "loose_opt_f64")]
    pub tax_rate: Option<f64>,
    #[serde(default, deserialize_with = "loose_opt_f64")]
    pub discount: Option<f64>,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub subtotal: f64,
    pub discount_amount: f64,
    pub net_price: f64,
    pub tax_amount: f64,
    pub total: f64,
}

impl InvoiceData {
    /// Derivación canónica: el descuento se aplica antes que el impuesto y el
    /// impuesto se calcula sobre el neto descontado, nunca sobre el subtotal
    /// bruto. Sin redondeo interno; el formato a dos decimales ocurre solo al
    /// mostrar o exportar. Nunca falla: entrada malformada degrada a 0.
    pub fn calculate_totals(&self) -> InvoiceTotals {
        let subtotal: f64 = self.items.iter().map(|item| item.amount()).sum();

        let discount_amount = subtotal * (self.discount.unwrap_or(0.0) / 100.0);
        let net_price = subtotal - discount_amount;
        let tax_amount = net_price * (self.tax_rate.unwrap_or(0.0) / 100.0);
        let total = net_price + tax_amount;

        InvoiceTotals {
            subtotal,
            discount_amount,
            net_price,
            tax_amount,
            total,
        }
    }

    /// Valida el contrato de entrada. Se llama en la frontera del servicio;
    /// el motor de cálculo no valida nunca.
    pub fn validate(&self) -> ExportResult<()> {
        if self.invoice_number.trim().is_empty() {
            return Err(ExportError::ValidationError(
                "invoice number is required".to_string(),
            ));
        }

        if self.items.is_empty() {
            return Err(ExportError::ValidationError(
                "invoice must contain at least one item".to_string(),
            ));
        }

        for item in &self.items {
            if let Some(quantity) = item.quantity {
                if quantity < 1.0 || quantity.fract() != 0.0 {
                    return Err(ExportError::ValidationError(format!(
                        "item '{}' quantity must be a whole number of at least 1",
                        item.id
                    )));
                }
            }
            if let Some(rate) = item.rate {
                if rate < 0.0 {
                    return Err(ExportError::ValidationError(format!(
                        "item '{}' rate cannot be negative",
                        item.id
                    )));
                }
            }
        }

        if let Some(discount) = self.discount {
            if !(0.0..=100.0).contains(&discount) {
                return Err(ExportError::ValidationError(
                    "discount must be between 0 and 100".to_string(),
                ));
            }
        }

        if let Some(tax_rate) = self.tax_rate {
            if !(0.0..=100.0).contains(&tax_rate) {
                return Err(ExportError::ValidationError(
                    "tax rate must be between 0 and 100".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, quantity: Option<f64>, rate: Option<f64>) -> InvoiceItem {
        InvoiceItem {
            id: id.to_string(),
            name: format!("Item {}", id),
            description: None,
            quantity,
            rate,
        }
    }

    fn invoice(items: Vec<InvoiceItem>, discount: Option<f64>, tax_rate: Option<f64>) -> InvoiceData {
        InvoiceData {
            invoice_number: "INV-001".to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 8, 31).unwrap(),
            from_name: "Acme Studio".to_string(),
            from_email: "billing@acme.test".to_string(),
            from_address: "1 Factory Road\nPune 411001".to_string(),
            to_name: "Globex Ltd".to_string(),
            to_email: "accounts@globex.test".to_string(),
            to_address: "99 Market Street\nMumbai 400001".to_string(),
            items,
            notes: None,
            tax_rate,
            discount,
            logo: None,
        }
    }

    #[test]
    fn totals_apply_discount_before_tax_on_net() {
        let data = invoice(vec![item("1", Some(2.0), Some(100.0))], Some(10.0), Some(5.0));
        let totals = data.calculate_totals();

        assert_eq!(totals.subtotal, 200.0);
        assert_eq!(totals.discount_amount, 20.0);
        assert_eq!(totals.net_price, 180.0);
        assert_eq!(totals.tax_amount, 9.0);
        assert_eq!(totals.total, 189.0);
    }

    #[test]
    fn totals_collapse_to_subtotal_when_rates_are_zero() {
        let data = invoice(
            vec![item("1", Some(3.0), Some(50.0)), item("2", Some(1.0), Some(25.0))],
            Some(0.0),
            Some(0.0),
        );
        let totals = data.calculate_totals();

        assert_eq!(totals.subtotal, 175.0);
        assert_eq!(totals.discount_amount, 0.0);
        assert_eq!(totals.net_price, 175.0);
        assert_eq!(totals.tax_amount, 0.0);
        assert_eq!(totals.total, 175.0);
    }

    #[test]
    fn tax_applies_to_discounted_net_across_rate_grid() {
        let data = invoice(
            vec![item("1", Some(7.0), Some(133.37)), item("2", Some(2.0), Some(0.99))],
            None,
            None,
        );
        let subtotal = data.calculate_totals().subtotal;

        for discount in [0.0, 5.0, 10.0, 33.3, 50.0, 100.0] {
            for tax_rate in [0.0, 5.0, 12.5, 18.0, 100.0] {
                let mut data = data.clone();
                data.discount = Some(discount);
                data.tax_rate = Some(tax_rate);
                let totals = data.calculate_totals();

                let expected =
                    (subtotal - subtotal * discount / 100.0) * (1.0 + tax_rate / 100.0);
                assert!(
                    (totals.total - expected).abs() < 1e-9,
                    "discount={} tax={} total={} expected={}",
                    discount,
                    tax_rate,
                    totals.total,
                    expected
                );
            }
        }
    }

    #[test]
    fn calculate_totals_is_idempotent() {
        let data = invoice(vec![item("1", Some(4.0), Some(19.99))], Some(12.5), Some(18.0));
        assert_eq!(data.calculate_totals(), data.calculate_totals());
    }

    #[test]
    fn missing_rate_contributes_zero() {
        let data = invoice(
            vec![item("1", Some(5.0), None), item("2", Some(2.0), Some(30.0))],
            None,
            None,
        );
        assert_eq!(data.calculate_totals().subtotal, 60.0);
    }

    #[test]
    fn missing_quantity_contributes_zero() {
        let data = invoice(
            vec![item("1", None, Some(500.0)), item("2", Some(1.0), Some(40.0))],
            None,
            None,
        );
        assert_eq!(data.calculate_totals().subtotal, 40.0);
    }

    #[test]
    fn loose_numeric_strings_are_coerced() {
        let data: InvoiceData = serde_json::from_value(serde_json::json!({
            "invoiceNumber": "INV-002",
            "invoiceDate": "2026-08-01",
            "dueDate": "2026-08-31",
            "fromName": "Acme Studio",
            "fromEmail": "billing@acme.test",
            "fromAddress": "1 Factory Road",
            "toName": "Globex Ltd",
            "toEmail": "accounts@globex.test",
            "toAddress": "99 Market Street",
            "items": [
                { "id": "1", "name": "Design work", "quantity": "2", "rate": "150.50" }
            ],
            "taxRate": "12",
            "discount": null
        }))
        .unwrap();

        assert_eq!(data.items[0].quantity, Some(2.0));
        assert_eq!(data.items[0].rate, Some(150.5));
        assert_eq!(data.tax_rate, Some(12.0));
        assert_eq!(data.discount, None);
        assert_eq!(data.calculate_totals().subtotal, 301.0);
    }

    #[test]
    fn garbage_numeric_input_degrades_to_none() {
        let data: InvoiceData = serde_json::from_value(serde_json::json!({
            "invoiceNumber": "INV-003",
            "invoiceDate": "2026-08-01",
            "dueDate": "2026-08-31",
            "fromName": "Acme Studio",
            "fromEmail": "billing@acme.test",
            "fromAddress": "1 Factory Road",
            "toName": "Globex Ltd",
            "toEmail": "accounts@globex.test",
            "toAddress": "99 Market Street",
            "items": [
                { "id": "1", "name": "Design work", "quantity": "abc", "rate": "NaN" }
            ],
            "taxRate": "not-a-number"
        }))
        .unwrap();

        assert_eq!(data.items[0].quantity, None);
        assert_eq!(data.items[0].rate, None);
        assert_eq!(data.tax_rate, None);

        let totals = data.calculate_totals();
        assert_eq!(totals.subtotal, 0.0);
        assert_eq!(totals.total, 0.0);
    }

    #[test]
    fn validate_rejects_empty_items() {
        let data = invoice(vec![], None, None);
        let err = data.validate().unwrap_err();
        assert!(err.to_string().contains("at least one item"));
    }

    #[test]
    fn validate_rejects_blank_invoice_number() {
        let mut data = invoice(vec![item("1", Some(1.0), Some(10.0))], None, None);
        data.invoice_number = "   ".to_string();
        assert!(data.validate().is_err());
    }

    #[test]
    fn validate_rejects_fractional_or_zero_quantity() {
        let data = invoice(vec![item("1", Some(0.5), Some(10.0))], None, None);
        assert!(data.validate().is_err());

        let data = invoice(vec![item("1", Some(0.0), Some(10.0))], None, None);
        assert!(data.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_rates() {
        let data = invoice(vec![item("1", Some(1.0), Some(-5.0))], None, None);
        assert!(data.validate().is_err());

        let data = invoice(vec![item("1", Some(1.0), Some(10.0))], Some(101.0), None);
        assert!(data.validate().is_err());

        let data = invoice(vec![item("1", Some(1.0), Some(10.0))], None, Some(-1.0));
        assert!(data.validate().is_err());
    }

    #[test]
    fn validate_accepts_missing_optional_numerics() {
        let data = invoice(vec![item("1", None, None)], None, None);
        assert!(data.validate().is_ok());
    }
}
