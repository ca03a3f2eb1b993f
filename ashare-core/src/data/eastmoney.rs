//! Eastmoney data provider.
//!
//! Talks to Eastmoney's public JSON endpoints with a blocking client:
//! - `push2his` kline API for daily/weekly/monthly bars
//! - `push2` clist API for the market snapshot, board lists and board members
//! - `push2` stock/get API for a single company's profile fields
//! - `datacenter` report API for financial statements, valuation and holders
//!
//! Each query is one round trip (the clist API is paged, so a snapshot walks
//! its pages sequentially). Nothing is retried. The client timeout bounds
//! every request; a timeout surfaces as `DataError::Timeout`.

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value as Json};
use std::time::Duration;

use super::provider::{BoardKind, DataError, StatementKind, UpstreamProvider, UpstreamQuery};
use super::request::{Adjust, Period};
use super::symbol::Exchange;
use super::table::{Table, Value};

const KLINE_URL: &str = "https://push2his.eastmoney.com/api/qt/stock/kline/get";
const CLIST_URL: &str = "https://82.push2.eastmoney.com/api/qt/clist/get";
const QUOTE_URL: &str = "https://push2.eastmoney.com/api/qt/stock/get";
const DATACENTER_URL: &str = "https://datacenter.eastmoney.com/securities/api/data/v1/get";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Shanghai + Shenzhen + Beijing A-shares.
const A_SHARE_FILTER: &str = "m:0 t:6,m:0 t:80,m:1 t:2,m:1 t:23,m:0 t:81 s:2048";

const CLIST_PAGE_SIZE: usize = 100;
const REPORT_PAGE_SIZE: usize = 500;

const HISTORY_COLUMNS: [&str; 12] = [
    "日期", "股票代码", "开盘", "收盘", "最高", "最低", "成交量", "成交额", "振幅", "涨跌幅",
    "涨跌额", "换手率",
];

/// (field id, column) pairs for stock quote rows.
const QUOTE_FIELDS: &[(&str, &str)] = &[
    ("f12", "代码"),
    ("f14", "名称"),
    ("f2", "最新价"),
    ("f3", "涨跌幅"),
    ("f4", "涨跌额"),
    ("f5", "成交量"),
    ("f6", "成交额"),
    ("f7", "振幅"),
    ("f15", "最高"),
    ("f16", "最低"),
    ("f17", "今开"),
    ("f18", "昨收"),
    ("f10", "量比"),
    ("f8", "换手率"),
    ("f9", "市盈率-动态"),
    ("f23", "市净率"),
    ("f20", "总市值"),
    ("f21", "流通市值"),
];

const BOARD_NAME_COLUMN: &str = "板块名称";
const BOARD_CODE_COLUMN: &str = "板块代码";

const BOARD_FIELDS: &[(&str, &str)] = &[
    ("f14", BOARD_NAME_COLUMN),
    ("f12", BOARD_CODE_COLUMN),
    ("f2", "最新价"),
    ("f4", "涨跌额"),
    ("f3", "涨跌幅"),
    ("f20", "总市值"),
    ("f8", "换手率"),
    ("f104", "上涨家数"),
    ("f105", "下跌家数"),
    ("f128", "领涨股票"),
    ("f136", "领涨股票-涨跌幅"),
];

const PROFILE_FIELDS: &[(&str, &str)] = &[
    ("f57", "股票代码"),
    ("f58", "股票简称"),
    ("f84", "总股本"),
    ("f85", "流通股"),
    ("f127", "行业"),
    ("f116", "总市值"),
    ("f117", "流通市值"),
    ("f189", "上市时间"),
];

const SUMMARY_RENAMES: &[(&str, &str)] = &[
    ("SECURITY_CODE", "股票代码"),
    ("SECURITY_NAME_ABBR", "股票简称"),
    ("REPORT_DATE", "报告期"),
    ("EPSJB", "基本每股收益"),
    ("BPS", "每股净资产"),
    ("TOTALOPERATEREVE", "营业总收入"),
    ("PARENTNETPROFIT", "归母净利润"),
    ("ROEJQ", "净资产收益率"),
    ("XSMLL", "销售毛利率"),
    ("ZCFZL", "资产负债率"),
];

const STATEMENT_RENAMES: &[(&str, &str)] = &[
    ("SECURITY_CODE", "股票代码"),
    ("SECURITY_NAME_ABBR", "股票简称"),
    ("REPORT_DATE", "报告期"),
];

const VALUATION_RENAMES: &[(&str, &str)] = &[
    ("SECURITY_CODE", "股票代码"),
    ("TRADE_DATE", "交易日期"),
    ("CLOSE_PRICE", "收盘价"),
    ("PE_TTM", "市盈率TTM"),
    ("PE_LAR", "市盈率静"),
    ("PB_MRQ", "市净率"),
    ("PS_TTM", "市销率TTM"),
    ("TOTAL_MARKET_CAP", "总市值"),
];

const HOLDER_RENAMES: &[(&str, &str)] = &[
    ("END_DATE", "截止日期"),
    ("HOLDER_RANK", "名次"),
    ("HOLDER_NAME", "股东名称"),
    ("HOLDER_TYPE", "股东性质"),
    ("SHARES_TYPE", "股份类型"),
    ("HOLD_NUM", "持股数"),
    ("HOLD_NUM_RATIO", "占总股本持股比例"),
    ("HOLD_NUM_CHANGE", "增减"),
];

/// How a datacenter report is filtered for one stock.
#[derive(Debug, Clone, Copy)]
enum ReportFilter {
    /// `(SECUCODE="600000.SH")`
    Secucode,
    /// `(SECURITY_CODE="600000")`
    SecurityCode,
}

/// A datacenter report definition.
#[derive(Debug, Clone, Copy)]
struct Report {
    name: &'static str,
    filter: ReportFilter,
    sort_columns: &'static str,
    sort_types: &'static str,
    renames: &'static [(&'static str, &'static str)],
}

impl Report {
    fn for_statement(kind: StatementKind) -> Report {
        match kind {
            StatementKind::Summary => Report {
                name: "RPT_F10_FINANCE_MAINFINADATA",
                filter: ReportFilter::Secucode,
                sort_columns: "REPORT_DATE",
                sort_types: "-1",
                renames: SUMMARY_RENAMES,
            },
            StatementKind::BalanceSheet => Report {
                name: "RPT_F10_FINANCE_GBALANCE",
                filter: ReportFilter::Secucode,
                sort_columns: "REPORT_DATE",
                sort_types: "-1",
                renames: STATEMENT_RENAMES,
            },
            StatementKind::IncomeStatement => Report {
                name: "RPT_F10_FINANCE_GINCOME",
                filter: ReportFilter::Secucode,
                sort_columns: "REPORT_DATE",
                sort_types: "-1",
                renames: STATEMENT_RENAMES,
            },
            StatementKind::CashFlow => Report {
                name: "RPT_F10_FINANCE_GCASHFLOW",
                filter: ReportFilter::Secucode,
                sort_columns: "REPORT_DATE",
                sort_types: "-1",
                renames: STATEMENT_RENAMES,
            },
            StatementKind::Valuation => Report {
                name: "RPT_VALUEANALYSIS_DET",
                filter: ReportFilter::SecurityCode,
                sort_columns: "TRADE_DATE",
                sort_types: "1",
                renames: VALUATION_RENAMES,
            },
        }
    }

    fn holders() -> Report {
        Report {
            name: "RPT_F10_EH_HOLDERS",
            filter: ReportFilter::Secucode,
            sort_columns: "END_DATE,HOLDER_RANK",
            sort_types: "-1,1",
            renames: HOLDER_RENAMES,
        }
    }

    fn filter_for(&self, symbol: &str, exchange: Exchange) -> String {
        match self.filter {
            ReportFilter::Secucode => format!("(SECUCODE=\"{symbol}.{}\")", exchange.suffix()),
            ReportFilter::SecurityCode => format!("(SECURITY_CODE=\"{symbol}\")"),
        }
    }
}

// ─── Response envelopes ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct KlineResponse {
    data: Option<KlineData>,
}

#[derive(Debug, Deserialize)]
struct KlineData {
    code: String,
    klines: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ClistResponse {
    data: Option<ClistData>,
}

#[derive(Debug, Deserialize)]
struct ClistData {
    total: usize,
    diff: Vec<Map<String, Json>>,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    data: Option<Map<String, Json>>,
}

#[derive(Debug, Deserialize)]
struct DatacenterResponse {
    result: Option<DatacenterResult>,
}

#[derive(Debug, Deserialize)]
struct DatacenterResult {
    data: Vec<Map<String, Json>>,
}

/// Eastmoney data provider.
pub struct EastmoneyProvider {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl EastmoneyProvider {
    pub fn new(timeout: Duration) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, DataError> {
        tracing::debug!(url, ?params, "upstream request");
        let resp = self.client.get(url).query(params).send()?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        resp.json::<T>()
            .map_err(|e| DataError::ResponseFormatChanged(format!("{url}: {e}")))
    }

    fn history(
        &self,
        symbol: &str,
        period: Period,
        start_date: &str,
        end_date: &str,
        adjust: &Adjust,
    ) -> Result<Table, DataError> {
        let exchange = exchange_of(symbol)?;
        let klt = match period {
            Period::Daily => "101",
            Period::Weekly => "102",
            Period::Monthly => "103",
        };
        let fqt = match adjust {
            Adjust::Forward => "1",
            Adjust::Backward => "2",
            Adjust::Unadjusted => "0",
            Adjust::Other(tag) => tag.as_str(),
        };

        let params = [
            ("fields1", "f1,f2,f3,f4,f5,f6".to_string()),
            (
                "fields2",
                "f51,f52,f53,f54,f55,f56,f57,f58,f59,f60,f61".to_string(),
            ),
            ("ut", "7eea3edcaed734bea9cbfc24409ed989".to_string()),
            ("klt", klt.to_string()),
            ("fqt", fqt.to_string()),
            ("secid", format!("{}.{symbol}", exchange.secid_market())),
            ("beg", start_date.to_string()),
            ("end", end_date.to_string()),
        ];

        let resp: KlineResponse = self.get_json(KLINE_URL, &params)?;
        let data = resp.data.ok_or_else(|| DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        })?;
        parse_klines(&data.code, &data.klines)
    }

    /// Walk every page of a clist query.
    fn clist(&self, fs: &str, fields: &[(&str, &str)]) -> Result<Table, DataError> {
        let field_ids = fields.iter().map(|(id, _)| *id).collect::<Vec<_>>().join(",");
        let mut table = Table::new(fields.iter().map(|(_, col)| *col));
        let mut page = 1usize;

        loop {
            let params = [
                ("pn", page.to_string()),
                ("pz", CLIST_PAGE_SIZE.to_string()),
                ("po", "1".to_string()),
                ("np", "1".to_string()),
                ("ut", "bd1d9ddb04089700cf9c27f6f7426281".to_string()),
                ("fltt", "2".to_string()),
                ("invt", "2".to_string()),
                ("fid", "f3".to_string()),
                ("fs", fs.to_string()),
                ("fields", field_ids.clone()),
            ];

            let resp: ClistResponse = self.get_json(CLIST_URL, &params)?;
            match absorb_page(&mut table, resp, fields)? {
                Paging::More => page += 1,
                Paging::Done => break,
            }
        }

        Ok(table)
    }

    fn board_code(&self, kind: BoardKind, name: &str) -> Result<String, DataError> {
        if is_board_code(name) {
            return Ok(name.to_string());
        }

        let boards = self.clist(board_filter(kind), BOARD_FIELDS)?;
        find_board_code(&boards, name).ok_or_else(|| DataError::BoardNotFound {
            kind,
            name: name.to_string(),
        })
    }

    fn profile(&self, symbol: &str) -> Result<Table, DataError> {
        let exchange = exchange_of(symbol)?;
        let fields = PROFILE_FIELDS
            .iter()
            .map(|(id, _)| *id)
            .collect::<Vec<_>>()
            .join(",");
        let params = [
            ("ut", "fa5fd1943c7b386f172d6893dbfba10b".to_string()),
            ("fltt", "2".to_string()),
            ("invt", "2".to_string()),
            ("fields", fields),
            ("secid", format!("{}.{symbol}", exchange.secid_market())),
        ];

        let resp: QuoteResponse = self.get_json(QUOTE_URL, &params)?;
        let data = resp.data.ok_or_else(|| DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        })?;
        profile_table(&data)
    }

    fn report(&self, report: Report, symbol: &str) -> Result<Table, DataError> {
        let exchange = exchange_of(symbol)?;
        let params = [
            ("reportName", report.name.to_string()),
            ("columns", "ALL".to_string()),
            ("filter", report.filter_for(symbol, exchange)),
            ("pageNumber", "1".to_string()),
            ("pageSize", REPORT_PAGE_SIZE.to_string()),
            ("sortColumns", report.sort_columns.to_string()),
            ("sortTypes", report.sort_types.to_string()),
            ("source", "WEB".to_string()),
            ("client", "WEB".to_string()),
        ];

        let resp: DatacenterResponse = self.get_json(DATACENTER_URL, &params)?;
        match resp.result {
            Some(result) => records_to_table(&result.data, report.renames),
            None => Ok(Table::default()),
        }
    }
}

impl UpstreamProvider for EastmoneyProvider {
    fn name(&self) -> &str {
        "eastmoney"
    }

    fn query(&self, query: &UpstreamQuery) -> Result<Table, DataError> {
        match query {
            UpstreamQuery::History {
                symbol,
                period,
                start_date,
                end_date,
                adjust,
            } => self.history(symbol, *period, start_date, end_date, adjust),
            UpstreamQuery::Statement { symbol, kind } => {
                self.report(Report::for_statement(*kind), symbol)
            }
            UpstreamQuery::Snapshot => self.clist(A_SHARE_FILTER, QUOTE_FIELDS),
            UpstreamQuery::Profile { symbol } => self.profile(symbol),
            UpstreamQuery::TopHolders { symbol } => self.report(Report::holders(), symbol),
            UpstreamQuery::Boards { kind } => self.clist(board_filter(*kind), BOARD_FIELDS),
            UpstreamQuery::BoardMembers { kind, board } => {
                let code = self.board_code(*kind, board)?;
                self.clist(&format!("b:{code} f:!50"), QUOTE_FIELDS)
            }
        }
    }
}

// ─── Parsing ────────────────────────────────────────────────────────

fn exchange_of(symbol: &str) -> Result<Exchange, DataError> {
    Exchange::of(symbol).ok_or_else(|| DataError::SymbolNotFound {
        symbol: symbol.to_string(),
    })
}

fn board_filter(kind: BoardKind) -> &'static str {
    match kind {
        BoardKind::Industry => "m:90 t:2 f:!50",
        BoardKind::Concept => "m:90 t:3 f:!50",
        BoardKind::Region => "m:90 t:1 f:!50",
    }
}

/// `BK0475`-style identifiers are used as-is.
/// Whether another clist page should be requested.
#[derive(Debug, PartialEq, Eq)]
enum Paging {
    More,
    Done,
}

/// Append one clist page. Stops on `data: null`, an empty page, or once
/// `total` rows have been collected.
fn absorb_page(
    table: &mut Table,
    resp: ClistResponse,
    fields: &[(&str, &str)],
) -> Result<Paging, DataError> {
    let Some(data) = resp.data else {
        return Ok(Paging::Done);
    };
    if data.diff.is_empty() {
        return Ok(Paging::Done);
    }
    append_records(table, &data.diff, fields)?;
    if table.len() >= data.total {
        Ok(Paging::Done)
    } else {
        Ok(Paging::More)
    }
}

/// Exact board-name match in a board listing.
fn find_board_code(boards: &Table, name: &str) -> Option<String> {
    let name_idx = boards.column_index(BOARD_NAME_COLUMN)?;
    let code_idx = boards.column_index(BOARD_CODE_COLUMN)?;
    boards
        .rows()
        .iter()
        .find(|row| row[name_idx].as_text() == Some(name))
        .and_then(|row| row[code_idx].as_text())
        .map(str::to_string)
}

fn is_board_code(name: &str) -> bool {
    name.len() > 2
        && name.starts_with("BK")
        && name[2..].bytes().all(|b| b.is_ascii_digit())
}

/// Convert one JSON cell. `-` and empty strings are gaps; datetime strings
/// become dates.
fn cell(value: Option<&Json>) -> Value {
    match value {
        None | Some(Json::Null) => Value::Null,
        Some(Json::Number(n)) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
        Some(Json::String(s)) => text_cell(s),
        Some(Json::Bool(b)) => Value::Text(b.to_string()),
        Some(other) => Value::Text(other.to_string()),
    }
}

fn text_cell(s: &str) -> Value {
    if s.is_empty() || s == "-" {
        return Value::Null;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Value::Date(dt.date());
    }
    Value::Text(s.to_string())
}

/// Kline rows: `date,open,close,high,low,volume,amount,amplitude,pct,chg,turnover`.
fn parse_klines(code: &str, lines: &[String]) -> Result<Table, DataError> {
    let mut table = Table::new(HISTORY_COLUMNS);

    for line in lines {
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() != HISTORY_COLUMNS.len() - 1 {
            return Err(DataError::ResponseFormatChanged(format!(
                "kline row has {} fields: {line}",
                parts.len()
            )));
        }

        let date = NaiveDate::parse_from_str(parts[0], "%Y-%m-%d")
            .map(Value::Date)
            .unwrap_or_else(|_| Value::Text(parts[0].to_string()));

        let mut row = Vec::with_capacity(HISTORY_COLUMNS.len());
        row.push(date);
        row.push(Value::Text(code.to_string()));
        row.extend(parts[1..].iter().map(|p| {
            p.parse::<f64>()
                .map(Value::Number)
                .unwrap_or(Value::Null)
        }));
        table.push_row(row)?;
    }

    Ok(table)
}

fn append_records(
    table: &mut Table,
    records: &[Map<String, Json>],
    fields: &[(&str, &str)],
) -> Result<(), DataError> {
    for record in records {
        let row = fields.iter().map(|(id, _)| cell(record.get(*id))).collect();
        table.push_row(row)?;
    }
    Ok(())
}

/// Profile fields as `item`/`value` rows, in field order.
fn profile_table(data: &Map<String, Json>) -> Result<Table, DataError> {
    let mut table = Table::new(["item", "value"]);
    for (id, item) in PROFILE_FIELDS {
        let value = match (*id, data.get(*id)) {
            // Listing date arrives as a YYYYMMDD integer.
            ("f189", Some(Json::Number(n))) => n
                .as_i64()
                .and_then(|d| NaiveDate::parse_from_str(&d.to_string(), "%Y%m%d").ok())
                .map(Value::Date)
                .unwrap_or(Value::Null),
            (_, v) => cell(v),
        };
        table.push_row(vec![Value::from(*item), value])?;
    }
    Ok(table)
}

/// Datacenter records to a table. Columns follow the first record's key
/// order, renamed through `renames` where a mapping exists.
fn records_to_table(
    records: &[Map<String, Json>],
    renames: &[(&str, &str)],
) -> Result<Table, DataError> {
    let Some(first) = records.first() else {
        return Ok(Table::default());
    };

    let keys: Vec<&str> = first.keys().map(String::as_str).collect();
    let columns = keys.iter().map(|k| {
        renames
            .iter()
            .find(|(from, _)| from == k)
            .map(|(_, to)| *to)
            .unwrap_or(*k)
    });

    let mut table = Table::new(columns);
    for record in records {
        table.push_row(keys.iter().map(|k| cell(record.get(*k))).collect())?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Json) -> Map<String, Json> {
        match v {
            Json::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn parses_kline_rows() {
        let lines = vec![
            "2023-01-03,7.10,7.17,7.18,7.08,351000,250000000.00,1.41,1.13,0.08,0.12".to_string(),
            "2023-01-04,7.17,7.20,7.25,7.15,298000,214000000.00,1.39,0.42,0.03,0.10".to_string(),
        ];
        let t = parse_klines("600000", &lines).unwrap();
        assert_eq!(t.columns(), HISTORY_COLUMNS);
        assert_eq!(t.len(), 2);
        assert_eq!(
            t.rows()[0][0],
            Value::Date(NaiveDate::from_ymd_opt(2023, 1, 3).unwrap())
        );
        assert_eq!(t.rows()[0][1], Value::from("600000"));
        assert_eq!(t.rows()[1][3], Value::Number(7.20));
    }

    #[test]
    fn short_kline_row_is_a_format_error() {
        let lines = vec!["2023-01-03,7.10,7.17".to_string()];
        assert!(matches!(
            parse_klines("600000", &lines),
            Err(DataError::ResponseFormatChanged(_))
        ));
    }

    #[test]
    fn clist_records_map_dash_to_null() {
        let records = vec![map(json!({"f12": "600000", "f14": "浦发银行", "f2": "-"}))];
        let mut t = Table::new(["代码", "名称", "最新价"]);
        append_records(&mut t, &records, &QUOTE_FIELDS[..3]).unwrap();
        assert_eq!(t.rows()[0][1], Value::from("浦发银行"));
        assert!(t.rows()[0][2].is_null());
    }

    #[test]
    fn datacenter_records_keep_key_order_and_rename() {
        let records = vec![
            map(json!({
                "SECUCODE": "600000.SH",
                "REPORT_DATE": "2023-12-31 00:00:00",
                "ROEJQ": 5.21
            })),
            map(json!({
                "SECUCODE": "600000.SH",
                "REPORT_DATE": "2023-09-30 00:00:00",
                "ROEJQ": null
            })),
        ];
        let t = records_to_table(&records, SUMMARY_RENAMES).unwrap();
        assert_eq!(t.columns(), ["SECUCODE", "报告期", "净资产收益率"]);
        assert_eq!(
            t.rows()[0][1],
            Value::Date(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap())
        );
        assert_eq!(t.rows()[0][2], Value::Number(5.21));
        assert!(t.rows()[1][2].is_null());
    }

    #[test]
    fn empty_report_is_an_empty_table() {
        let t = records_to_table(&[], STATEMENT_RENAMES).unwrap();
        assert!(t.is_empty());
    }

    #[test]
    fn profile_rows_in_field_order() {
        let data = map(json!({
            "f57": "600000",
            "f58": "浦发银行",
            "f84": 29352000000.0,
            "f127": "银行",
            "f189": 19991110
        }));
        let t = profile_table(&data).unwrap();
        assert_eq!(t.columns(), ["item", "value"]);
        assert_eq!(t.len(), PROFILE_FIELDS.len());
        assert_eq!(t.rows()[1][1], Value::from("浦发银行"));
        assert!(t.rows()[3][1].is_null());
        assert_eq!(
            t.rows()[7][1],
            Value::Date(NaiveDate::from_ymd_opt(1999, 11, 10).unwrap())
        );
    }

    #[test]
    fn board_code_detection() {
        assert!(is_board_code("BK0475"));
        assert!(!is_board_code("银行"));
        assert!(!is_board_code("BK"));
        assert!(!is_board_code("BKabc"));
    }

    #[test]
    fn report_filters() {
        let summary = Report::for_statement(StatementKind::Summary);
        assert_eq!(
            summary.filter_for("600000", Exchange::Shanghai),
            "(SECUCODE=\"600000.SH\")"
        );
        let valuation = Report::for_statement(StatementKind::Valuation);
        assert_eq!(
            valuation.filter_for("000001", Exchange::Shenzhen),
            "(SECURITY_CODE=\"000001\")"
        );
    }

    fn clist_page(v: Json) -> ClistResponse {
        serde_json::from_value(v).unwrap()
    }

    fn quote_table() -> Table {
        Table::new(QUOTE_FIELDS[..2].iter().map(|(_, col)| *col))
    }

    #[test]
    fn paging_continues_until_total_is_reached() {
        let fields = &QUOTE_FIELDS[..2];
        let mut t = quote_table();

        let first = clist_page(json!({"data": {"total": 3, "diff": [
            {"f12": "600000", "f14": "浦发银行"},
            {"f12": "600036", "f14": "招商银行"}
        ]}}));
        assert_eq!(absorb_page(&mut t, first, fields).unwrap(), Paging::More);

        let second = clist_page(json!({"data": {"total": 3, "diff": [
            {"f12": "000001", "f14": "平安银行"}
        ]}}));
        assert_eq!(absorb_page(&mut t, second, fields).unwrap(), Paging::Done);
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn paging_stops_on_null_data_or_empty_page() {
        let fields = &QUOTE_FIELDS[..2];
        let mut t = quote_table();

        let null = clist_page(json!({"data": null}));
        assert_eq!(absorb_page(&mut t, null, fields).unwrap(), Paging::Done);

        let empty = clist_page(json!({"data": {"total": 50, "diff": []}}));
        assert_eq!(absorb_page(&mut t, empty, fields).unwrap(), Paging::Done);
        assert!(t.is_empty());
    }

    #[test]
    fn board_name_resolves_to_its_code() {
        let mut boards = Table::new(BOARD_FIELDS[..2].iter().map(|(_, col)| *col));
        boards
            .push_row(vec![Value::from("银行"), Value::from("BK0475")])
            .unwrap();
        boards
            .push_row(vec![Value::from("证券"), Value::from("BK0473")])
            .unwrap();

        assert_eq!(find_board_code(&boards, "证券").as_deref(), Some("BK0473"));
        assert_eq!(find_board_code(&boards, "银"), None);
        assert_eq!(find_board_code(&Table::new(["其他"]), "银行"), None);
    }

    #[test]
    fn malformed_symbol_fails_before_any_request() {
        let provider = EastmoneyProvider::new(Duration::from_millis(1)).unwrap();
        assert_eq!(provider.timeout(), Duration::from_millis(1));
        let err = provider
            .query(&UpstreamQuery::Profile {
                symbol: "not-a-code".into(),
            })
            .unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }
}
