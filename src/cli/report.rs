use ansi_term::Style;
use anyhow::Result;
use clap::Parser;

use crate::{
    tracker::{
        entities::IterationId,
        report::{build_report, Grouping, Report, ReportFilter},
    },
    utils::time::format_hours,
};

use super::{dates::day_range, dates::DATE_HELP, find_iteration, find_optional_project, Context};

#[derive(Debug, Parser)]
pub struct ReportCommand {
    #[arg(short, long, help = "Only time logged on tickets of this project")]
    project: Option<String>,
    #[arg(
        short,
        long,
        help = "Only time logged on tickets of this iteration. Ignored when it doesn't belong to --project"
    )]
    iteration: Option<IterationId>,
    #[arg(
        short,
        long,
        help = "Case insensitive text matched against ticket name, ticket id and note"
    )]
    search: Option<String>,
    #[arg(short, long, value_enum, default_value_t = Grouping::Individual)]
    group: Grouping,
    #[arg(long, help = format!("First day, inclusive. {DATE_HELP}"))]
    from: Option<String>,
    #[arg(long, help = format!("Last day, inclusive. {DATE_HELP}"))]
    to: Option<String>,
}

pub async fn process_report_command(
    ReportCommand {
        project,
        iteration,
        search,
        group,
        from,
        to,
    }: ReportCommand,
    context: &Context,
) -> Result<()> {
    let store = context.database.load().await?;

    let mut filter = ReportFilter::default();
    if let Some(iteration) = iteration {
        find_iteration(&store, iteration)?;
        filter.select_iteration(Some(iteration));
    }
    // Without --project the iteration filters on its own.
    if let Some(project) = find_optional_project(&store, project.as_deref())? {
        if filter.select_project(&store, Some(project.id)) {
            println!("The iteration is not part of {:?}, ignoring it", project.name);
        }
    }
    if let Some(search) = search {
        filter.set_search(&search);
    }
    let (from, to) = day_range(from.as_deref(), to.as_deref(), context.date_style)?;
    filter.set_range(from, to);

    let report = build_report(&store, &filter, group);
    print!("{}", render_report(&report));
    Ok(())
}

fn render_report(report: &Report) -> String {
    if report.is_empty() {
        return "No time logged\n".to_string();
    }
    let mut text = String::new();
    for row in &report.rows {
        text.push_str(&format!(
            "{}\t{}\t{}\t{:.2}h\n",
            row.name,
            row.subtitle,
            format_hours(row.hours),
            row.hours
        ));
    }
    text.push_str(&format!(
        "{}\n",
        Style::new().bold().paint(format!(
            "Total\t{} entries\t{}\t{:.2}h",
            report.entry_count,
            format_hours(report.total_hours),
            report.total_hours
        ))
    ));
    text
}
