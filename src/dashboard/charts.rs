//! Chart generation for the dashboard.
//!
//! The spending chart is generated as JSON configuration for the ECharts
//! library and rendered into an HTML container by a small initialization
//! script in the page head.

use charming::{
    Chart,
    component::{Axis, Grid, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger,
    },
    series::Bar,
};
use maud::{Markup, PreEscaped, html};

use crate::{dashboard::aggregation::CategorySpending, html::HeadElement};

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML container for a dashboard chart.
pub(super) fn chart_view(chart: &DashboardChart) -> Markup {
    html!(
        div
            id=(chart.id)
            class="w-full min-h-[380px] rounded dark:bg-gray-100"
        {}
    )
}

/// Generates JavaScript initialization code for a dashboard chart.
///
/// The script initializes an ECharts instance with dark mode support and
/// responsive resizing.
pub(super) fn chart_script(chart: &DashboardChart) -> HeadElement {
    let script = format!(
        r#"document.addEventListener('DOMContentLoaded', function() {{
            const chartDom = document.getElementById("{}");
            const chart = echarts.init(chartDom);
            const option = {};
            chart.setOption(option);

            window.addEventListener('resize', chart.resize);

            const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
            const updateTheme = () => {{
                const isDarkMode = darkModeMediaQuery.matches;
                chart.setTheme(isDarkMode ? 'dark' : 'default');
            }}
            darkModeMediaQuery.addEventListener('change', updateTheme);
            updateTheme();
        }});"#,
        chart.id, chart.options
    );

    HeadElement::ScriptSource(PreEscaped(script))
}

/// Builds a bar chart of spending per category, largest first.
pub(super) fn spending_chart(spending_by_category: &[CategorySpending]) -> Chart {
    let labels: Vec<String> = spending_by_category
        .iter()
        .map(|entry| entry.name.clone())
        .collect();
    let values: Vec<f64> = spending_by_category
        .iter()
        .map(|entry| entry.spent.to_decimal())
        .collect();

    Chart::new()
        .title(Title::new().text("Spending by category"))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Axis)
                .value_formatter(currency_formatter())
                .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow)),
        )
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Bar::new().name("Spent").data(values))
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}
