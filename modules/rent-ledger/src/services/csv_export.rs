//! Collection report CSV rendering
//!
//! Merges regular (mirror) collections and daily-accommodation collections
//! into one sheet, newest transaction first. Every cell is quoted; embedded
//! quotes are doubled by the `csv` writer.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;

use crate::billing::{billing_month, start_of_day_utc};
use crate::repos::collection_repo::CollectionExportRow;
use crate::repos::tenant_repo::DailyCollectionRow;

pub const CSV_HEADER: [&str; 8] = [
    "Type",
    "Transaction Date-Time",
    "Tenant Name",
    "Room Number",
    "Billing Month",
    "Amount",
    "Account Name",
    "Account Mode",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportRowKind {
    RegularRent,
    DailyCollection,
}

impl ExportRowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportRowKind::RegularRent => "REGULAR_RENT",
            ExportRowKind::DailyCollection => "DAILY_COLLECTION",
        }
    }
}

/// One line of the collection report
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub kind: ExportRowKind,
    pub transaction_at: DateTime<Utc>,
    pub tenant_name: String,
    pub room_number: String,
    pub billing_month: NaiveDate,
    pub amount: Decimal,
    pub account_name: Option<String>,
    pub account_mode: Option<String>,
}

impl From<CollectionExportRow> for ExportRow {
    fn from(row: CollectionExportRow) -> Self {
        ExportRow {
            kind: ExportRowKind::RegularRent,
            transaction_at: row.collected_at,
            tenant_name: row.tenant_name,
            room_number: row.room_number,
            billing_month: row.billing_month,
            amount: row.collected_amount,
            account_name: row.account_name,
            account_mode: row.account_mode,
        }
    }
}

impl From<DailyCollectionRow> for ExportRow {
    fn from(row: DailyCollectionRow) -> Self {
        let date = row.daily_collection_transaction_date;
        ExportRow {
            kind: ExportRowKind::DailyCollection,
            transaction_at: start_of_day_utc(date),
            tenant_name: row.full_name,
            room_number: row.room_number,
            billing_month: billing_month(date),
            amount: row.daily_collection_amount,
            account_name: row.account_name,
            account_mode: row.account_mode,
        }
    }
}

/// Render rows as UTF-8 CSV bytes, newest first
pub fn render_csv(mut rows: Vec<ExportRow>) -> Result<Vec<u8>, csv::Error> {
    rows.sort_by(|a, b| b.transaction_at.cmp(&a.transaction_at));

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for row in &rows {
        writer.write_record([
            row.kind.as_str().to_string(),
            row.transaction_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            row.tenant_name.clone(),
            row.room_number.clone(),
            row.billing_month.to_string(),
            row.amount.to_string(),
            row.account_name.clone().unwrap_or_default(),
            row.account_mode.clone().unwrap_or_default(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn regular(name: &str, at: DateTime<Utc>, amount: i64) -> ExportRow {
        ExportRow {
            kind: ExportRowKind::RegularRent,
            transaction_at: at,
            tenant_name: name.to_string(),
            room_number: "101".to_string(),
            billing_month: billing_month(at.date_naive()),
            amount: Decimal::new(amount * 100, 2),
            account_name: Some("HDFC".to_string()),
            account_mode: Some("BANK".to_string()),
        }
    }

    fn render_to_string(rows: Vec<ExportRow>) -> String {
        String::from_utf8(render_csv(rows).unwrap()).unwrap()
    }

    #[test]
    fn test_header_and_quoted_cells() {
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
        let out = render_to_string(vec![regular("Asha", at, 5000)]);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(
            lines[0],
            r#""Type","Transaction Date-Time","Tenant Name","Room Number","Billing Month","Amount","Account Name","Account Mode""#
        );
        assert_eq!(
            lines[1],
            r#""REGULAR_RENT","2024-03-15T10:00:00Z","Asha","101","2024-03-01","5000.00","HDFC","BANK""#
        );
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn test_quote_in_name_is_doubled_and_round_trips() {
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
        let bytes = render_csv(vec![regular("O\"Brien", at, 100)]).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains(r#""O""Brien""#));

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[2], "O\"Brien");
    }

    #[test]
    fn test_rows_sorted_newest_first_across_sources() {
        let older = Utc.with_ymd_and_hms(2024, 3, 2, 8, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2024, 3, 20, 8, 0, 0).unwrap();
        let daily = ExportRow::from(DailyCollectionRow {
            tenant_id: uuid::Uuid::new_v4(),
            full_name: "Ravi".to_string(),
            room_number: "B2".to_string(),
            daily_collection_amount: Decimal::new(75000, 2),
            daily_collection_transaction_date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            account_name: None,
            account_mode: None,
        });

        let out = render_to_string(vec![regular("Old", older, 10), daily, regular("New", newer, 20)]);
        let names: Vec<String> = csv::Reader::from_reader(out.as_bytes())
            .records()
            .map(|r| r.unwrap()[2].to_string())
            .collect();
        assert_eq!(names, vec!["New", "Ravi", "Old"]);
    }

    #[test]
    fn test_daily_row_shape() {
        let row = ExportRow::from(DailyCollectionRow {
            tenant_id: uuid::Uuid::new_v4(),
            full_name: "Ravi".to_string(),
            room_number: "B2".to_string(),
            daily_collection_amount: Decimal::new(75000, 2),
            daily_collection_transaction_date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            account_name: None,
            account_mode: None,
        });
        let out = render_to_string(vec![row]);
        let data_line = out.lines().nth(1).unwrap();
        assert_eq!(
            data_line,
            r#""DAILY_COLLECTION","2024-03-10T00:00:00Z","Ravi","B2","2024-03-01","750.00","","""#
        );
    }

    #[test]
    fn test_empty_export_has_header_only() {
        let out = render_to_string(Vec::new());
        assert_eq!(out.lines().count(), 1);
    }
}
