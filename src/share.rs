use crate::core::format::{format_long_date, format_money};
use crate::models::{InvoiceData, InvoiceTotals};

/// Asunto y cuerpo listos para un correo de envío de factura. La factura va
/// adjunta por fuera; aquí solo se produce el texto.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailShare {
    pub subject: String,
    pub body: String,
}

pub fn email_share(data: &InvoiceData, totals: &InvoiceTotals, currency_prefix: &str) -> EmailShare {
    EmailShare {
        subject: format!("Invoice {} from {}", data.invoice_number, data.from_name),
        body: format!(
            "Dear {},\n\nPlease find attached invoice {} for your records.\n\nTotal amount due: {}\nDue date: {}\n\nThank you for your business.\n\nBest regards,\n{}",
            data.to_name,
            data.invoice_number,
            format_money(totals.total, currency_prefix),
            format_long_date(data.due_date),
            data.from_name
        ),
    }
}

pub fn whatsapp_share(data: &InvoiceData, totals: &InvoiceTotals, currency_prefix: &str) -> String {
    format!(
        "Invoice {} from {}\n\nTotal amount due: {}\nDue date: {}\n\nThank you for your business.",
        data.invoice_number,
        data.from_name,
        format_money(totals.total, currency_prefix),
        format_long_date(data.due_date)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvoiceItem;
    use chrono::NaiveDate;

    fn fixture() -> (InvoiceData, InvoiceTotals) {
        let data = InvoiceData {
            invoice_number: "INV-007".to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2026, 8, 16).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 9, 15).unwrap(),
            from_name: "Acme Studio".to_string(),
            from_email: "billing@acme.test".to_string(),
            from_address: "1 Factory Road".to_string(),
            to_name: "Globex Ltd".to_string(),
            to_email: "accounts@globex.test".to_string(),
            to_address: "99 Market Street".to_string(),
            items: vec![InvoiceItem {
                id: "1".to_string(),
                name: "Consulting".to_string(),
                description: None,
                quantity: Some(1.0),
                rate: Some(175.0),
            }],
            notes: None,
            tax_rate: None,
            discount: None,
            logo: None,
        };
        let totals = data.calculate_totals();
        (data, totals)
    }

    #[test]
    fn email_share_matches_template() {
        let (data, totals) = fixture();
        let share = email_share(&data, &totals, "Rs.");

        assert_eq!(share.subject, "Invoice INV-007 from Acme Studio");
        assert_eq!(
            share.body,
            "Dear Globex Ltd,\n\nPlease find attached invoice INV-007 for your records.\n\nTotal amount due: Rs.175.00\nDue date: September 15th, 2026\n\nThank you for your business.\n\nBest regards,\nAcme Studio"
        );
    }

    #[test]
    fn whatsapp_share_matches_template() {
        let (data, totals) = fixture();
        let message = whatsapp_share(&data, &totals, "Rs.");

        assert_eq!(
            message,
            "Invoice INV-007 from Acme Studio\n\nTotal amount due: Rs.175.00\nDue date: September 15th, 2026\n\nThank you for your business."
        );
    }

    #[test]
    fn share_total_follows_currency_prefix() {
        let (data, totals) = fixture();
        let message = whatsapp_share(&data, &totals, "INR ");
        assert!(message.contains("Total amount due: INR 175.00"));
    }
}
