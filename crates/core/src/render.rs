use crate::domain::plan::AllocationPlan;
use crate::domain::report::ReportRecord;
use chrono::NaiveDate;

pub const COL_CODE: &str = "股票代码";
pub const COL_NAME: &str = "股票名称";
pub const COL_REPORT_COUNT: &str = "近一个月个股研报数目";
pub const COL_SHARES: &str = "买入股数";

pub fn push_title(date: NaiveDate) -> String {
    format!("{}个股研报策略选股结果", date.format("%Y-%m-%d"))
}

pub fn format_price(price: Option<f64>) -> String {
    price.map(|p| format!("{p:.2}")).unwrap_or_default()
}

/// The plan as a markdown pipe table, suitable as a push body.
pub fn render_markdown(plan: &AllocationPlan) -> String {
    let header = [COL_CODE, COL_NAME, COL_REPORT_COUNT, plan.basis.label(), COL_SHARES];
    let rows = plan.rows.iter().map(|r| {
        vec![
            r.code.clone(),
            r.name.clone(),
            r.report_count.to_string(),
            format_price(r.reference_price(plan.basis)),
            r.shares.to_string(),
        ]
    });
    pipe_table(&header, rows)
}

/// Every fetched report, one row each.
pub fn render_reports_markdown(reports: &[ReportRecord]) -> String {
    let header = [
        COL_NAME,
        COL_CODE,
        "研报标题",
        "机构名称",
        "评级",
        "上次评级",
        COL_REPORT_COUNT,
        "预测今年市盈率",
        "预测今年每股收益",
        "行业名称",
        "发布日期",
    ];
    let rows = reports.iter().map(|r| {
        vec![
            r.stock_name.clone(),
            r.stock_code.clone(),
            r.title.clone(),
            r.org_short_name.clone(),
            r.rating.clone(),
            r.last_rating.clone(),
            r.report_count.to_string(),
            format_price(r.predict_this_year_pe),
            format_price(r.predict_this_year_eps),
            r.industry_name.clone(),
            r.publish_day().to_string(),
        ]
    });
    pipe_table(&header, rows)
}

fn pipe_table(header: &[&str], rows: impl Iterator<Item = Vec<String>>) -> String {
    let mut out = String::new();
    out.push_str(&format!("| {} |\n", header.join(" | ")));
    out.push_str(&format!("|{}\n", "---|".repeat(header.len())));
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| escape_cell(c)).collect();
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    out
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\r', '\n'], " ")
}
