use yanbao_core::domain::plan::AllocationPlan;
use yanbao_core::domain::report::ReportRecord;
use yanbao_core::ingest::FetchReport;
use yanbao_core::pipeline::{RunConfig, RunOutput};
use yanbao_core::render::{format_price, COL_CODE, COL_NAME, COL_REPORT_COUNT, COL_SHARES};

const QUOTE_CENTER_URL: &str = "http://quote.eastmoney.com/center/";
const REPORT_LISTING_URL: &str = "https://data.eastmoney.com/report/stock.jshtml";

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(body: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"zh-CN\">\n<head>\n<meta charset=\"utf-8\">\n\
<title>个股研报选股</title>\n\
<style>body{{font-family:sans-serif;margin:1.5rem}}table{{border-collapse:collapse}}\
td,th{{border:1px solid #ccc;padding:.25rem .5rem}}form{{margin-bottom:1rem}}\
.err{{color:#b00}}.ok{{color:#070}}.progress{{color:#666;font-size:.9em}}</style>\n\
</head>\n<body>\n{body}\n</body>\n</html>\n"
    )
}

fn checked(on: bool) -> &'static str {
    if on {
        " checked"
    } else {
        ""
    }
}

/// Hidden copies of the inputs, so push/report buttons re-run the same query.
fn hidden_inputs(cfg: &RunConfig) -> String {
    let mut out = format!(
        "<input type=\"hidden\" name=\"submitted\" value=\"1\">\
<input type=\"hidden\" name=\"begin\" value=\"{}\">\
<input type=\"hidden\" name=\"end\" value=\"{}\">\
<input type=\"hidden\" name=\"count\" value=\"{}\">\
<input type=\"hidden\" name=\"budget\" value=\"{}\">",
        cfg.range.begin_str(),
        cfg.range.end_str(),
        cfg.criteria.limit,
        cfg.budget_per_stock,
    );
    if cfg.criteria.rating.is_some() {
        out.push_str("<input type=\"hidden\" name=\"buy_only\" value=\"on\">");
    }
    if cfg.criteria.rank_by_report_count {
        out.push_str("<input type=\"hidden\" name=\"rank\" value=\"on\">");
    }
    out
}

fn form(cfg: &RunConfig) -> String {
    format!(
        "<form method=\"get\" action=\"/\">\n\
<input type=\"hidden\" name=\"submitted\" value=\"1\">\n\
<label>起始日期 <input type=\"date\" name=\"begin\" value=\"{begin}\"></label>\n\
<label>结束日期 <input type=\"date\" name=\"end\" value=\"{end}\"></label>\n\
<h4>设置选股条件</h4>\n\
<label><input type=\"checkbox\" name=\"buy_only\"{buy}> 投资评级为买入</label>\n\
<label><input type=\"checkbox\" name=\"rank\"{rank}> 选择研报数量最多的股票</label>\n\
<label>买入股票数量 <input type=\"number\" name=\"count\" min=\"1\" value=\"{count}\"></label>\n\
<label>每只股票买入金额 \
<input type=\"number\" name=\"budget\" min=\"1\" step=\"10000\" value=\"{budget}\"></label>\n\
<button type=\"submit\">选股</button>\n\
</form>\n",
        begin = cfg.range.begin_str(),
        end = cfg.range.end_str(),
        buy = checked(cfg.criteria.rating.is_some()),
        rank = checked(cfg.criteria.rank_by_report_count),
        count = cfg.criteria.limit,
        budget = cfg.budget_per_stock,
    )
}

fn links() -> String {
    format!(
        "<p><a href=\"{QUOTE_CENTER_URL}\"><button type=\"button\">行情中心</button></a> \
<a href=\"{REPORT_LISTING_URL}\"><button type=\"button\">个股研报</button></a></p>\n"
    )
}

fn progress(fetch: &FetchReport) -> String {
    let lines: Vec<String> = fetch
        .progress_lines()
        .iter()
        .map(|l| format!("<div>{}</div>", escape(l)))
        .collect();
    format!("<div class=\"progress\">{}</div>\n", lines.join(""))
}

pub fn plan_table(plan: &AllocationPlan) -> String {
    let mut out = format!(
        "<table>\n<tr><th>{COL_CODE}</th><th>{COL_NAME}</th><th>{COL_REPORT_COUNT}</th>\
<th>{}</th><th>{COL_SHARES}</th></tr>\n",
        plan.basis.label()
    );
    for r in &plan.rows {
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(&r.code),
            escape(&r.name),
            r.report_count,
            format_price(r.reference_price(plan.basis)),
            r.shares
        ));
    }
    out.push_str("</table>\n");
    out
}

pub fn reports_table(reports: &[ReportRecord]) -> String {
    let mut out = String::from(
        "<table>\n<tr><th>股票名称</th><th>股票代码</th><th>研报标题</th><th>机构</th><th>机构名称</th>\
<th>预测今年市盈率</th><th>预测今年每股收益</th><th>预测明年市盈率</th><th>预测明年每股收益</th>\
<th>预测后年市盈率</th><th>预测后年每股收益</th><th>行业名称</th><th>行业代码</th><th>评级</th>\
<th>上次评级</th><th>近一个月个股研报数目</th><th>发布日期</th></tr>\n",
    );
    for r in reports {
        let cells = [
            escape(&r.stock_name),
            escape(&r.stock_code),
            escape(&r.title),
            escape(&r.org_name),
            escape(&r.org_short_name),
            format_price(r.predict_this_year_pe),
            format_price(r.predict_this_year_eps),
            format_price(r.predict_next_year_pe),
            format_price(r.predict_next_year_eps),
            format_price(r.predict_next_two_year_pe),
            format_price(r.predict_next_two_year_eps),
            escape(&r.industry_name),
            escape(&r.industry_code),
            escape(&r.rating),
            escape(&r.last_rating),
            r.report_count.to_string(),
            escape(r.publish_day()),
        ];
        out.push_str("<tr>");
        for c in cells {
            out.push_str(&format!("<td>{c}</td>"));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n");
    out
}

fn actions(cfg: &RunConfig) -> String {
    let hidden = hidden_inputs(cfg);
    format!(
        "<form method=\"post\" action=\"/push\" style=\"display:inline\">{hidden}\
<button type=\"submit\">推送到微信</button></form>\n\
<form method=\"get\" action=\"/reports\" style=\"display:inline\">{hidden}\
<button type=\"submit\">显示所有个股研报</button></form>\n"
    )
}

pub fn picks_page(cfg: &RunConfig, output: &RunOutput, notice: Option<Notice>) -> String {
    let mut body = String::new();
    body.push_str(&form(cfg));
    body.push_str(&progress(&output.fetch));
    body.push_str(&links());
    if let Some(n) = notice {
        body.push_str(&n.html());
    }
    body.push_str("<p>买入股票：</p>\n");
    body.push_str(&plan_table(&output.plan));
    body.push_str(&actions(cfg));
    layout(&body)
}

pub fn reports_page(cfg: &RunConfig, fetch: &FetchReport) -> String {
    let mut body = String::new();
    body.push_str(&form(cfg));
    body.push_str(&format!(
        "<p>{} 至 {} 共 {} 条个股研报</p>\n",
        cfg.range.begin_str(),
        cfg.range.end_str(),
        fetch.records.len()
    ));
    body.push_str(&reports_table(&fetch.records));
    layout(&body)
}

pub fn error_page(cfg: Option<&RunConfig>, message: &str) -> String {
    let mut body = String::new();
    if let Some(cfg) = cfg {
        body.push_str(&form(cfg));
    }
    body.push_str(&format!("<p class=\"err\">报错，报错内容：{}</p>\n", escape(message)));
    layout(&body)
}

#[derive(Debug, Clone)]
pub enum Notice {
    Pushed,
    PushFailed(String),
}

impl Notice {
    fn html(&self) -> String {
        match self {
            Self::Pushed => "<p class=\"ok\">推送成功</p>\n".to_string(),
            Self::PushFailed(msg) => format!("<p class=\"err\">推送失败：{}</p>\n", escape(msg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yanbao_core::domain::plan::{AllocationRow, PriceBasis};
    use yanbao_core::time::cn_market::DateRange;

    fn cfg() -> RunConfig {
        let range = DateRange::parse("2026-01-04", Some("2026-01-05"), chrono::Utc::now()).unwrap();
        RunConfig::new(range)
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape("<a href=\"x\">&'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn form_reflects_config() {
        let mut c = cfg();
        c.criteria.rank_by_report_count = false;
        let html = form(&c);
        assert!(html.contains("name=\"begin\" value=\"2026-01-04\""));
        assert!(html.contains("name=\"buy_only\" checked"));
        assert!(html.contains("name=\"rank\">"));
        assert!(html.contains("name=\"count\" min=\"1\" value=\"10\""));
        assert!(html.contains("step=\"10000\" value=\"100000\""));
    }

    #[test]
    fn hidden_inputs_carry_toggles() {
        let mut c = cfg();
        c.criteria.rating = None;
        let html = hidden_inputs(&c);
        assert!(!html.contains("buy_only"));
        assert!(html.contains("name=\"rank\" value=\"on\""));
    }

    #[test]
    fn plan_table_escapes_names() {
        let plan = AllocationPlan {
            basis: PriceBasis::Latest,
            budget_per_stock: 100_000.0,
            rows: vec![AllocationRow {
                code: "sh600000".to_string(),
                name: "<b>x</b>".to_string(),
                report_count: 2,
                latest_price: Some(12.5),
                previous_close: None,
                shares: 8100,
            }],
        };
        let html = plan_table(&plan);
        assert!(html.contains("<td>&lt;b&gt;x&lt;/b&gt;</td>"));
        assert!(html.contains("<td>12.50</td>"));
        assert!(html.contains("<th>最新价</th>"));
    }
}
