//! `strata impact` command implementation.

use colored::Colorize;
use strata::impact::{
    AnnotatedInterface, ApplicationImpact, ApplicationSeed, ChangeRequestImpact, ChangeRequestSeed,
    ImpactedProcess, InterfaceImpact,
};
use strata::{ApplicationId, ChangeRequestId, InterfaceId, Result};

use super::Context;
use super::display::{join_ids, print_json, print_section, process_label, risk};

/// Run `impact app`.
pub fn run_applications(ctx: &Context, ids: &[i64], json: bool) -> Result<()> {
    let strata = ctx.open()?;
    let analyzer = strata.impact();
    let report = match ids {
        [id] => analyzer.analyze_application(ApplicationId(*id))?,
        _ => {
            let ids: Vec<ApplicationId> = ids.iter().copied().map(ApplicationId).collect();
            analyzer.analyze_applications(&ids)?
        }
    };

    if json {
        return print_json(&report);
    }
    match report {
        Some(report) => print_application_impact(&report),
        None => not_found("application", ids),
    }
    Ok(())
}

/// Run `impact cr`.
pub fn run_change_requests(ctx: &Context, ids: &[i64], json: bool) -> Result<()> {
    let strata = ctx.open()?;
    let analyzer = strata.impact();
    let report = match ids {
        [id] => analyzer.analyze_change_request(ChangeRequestId(*id))?,
        _ => {
            let ids: Vec<ChangeRequestId> = ids.iter().copied().map(ChangeRequestId).collect();
            analyzer.analyze_change_requests(&ids)?
        }
    };

    if json {
        return print_json(&report);
    }
    match report {
        Some(report) => print_change_request_impact(&report),
        None => not_found("change request", ids),
    }
    Ok(())
}

/// Run `impact interface`.
pub fn run_interfaces(ctx: &Context, ids: &[i64], json: bool) -> Result<()> {
    let strata = ctx.open()?;
    let ids: Vec<InterfaceId> = ids.iter().copied().map(InterfaceId).collect();
    let report = strata.impact().analyze_interfaces(&ids)?;

    if json {
        return print_json(&report);
    }
    match report {
        Some(report) => print_interface_impact(&report),
        None => not_found(
            "interface",
            &ids.iter().map(|id| id.as_i64()).collect::<Vec<_>>(),
        ),
    }
    Ok(())
}

fn not_found(kind: &str, ids: &[i64]) {
    println!(
        "{}",
        format!("No {kind} found for id(s) {}.", join_ids(ids)).yellow()
    );
}

fn interface_line(i: &AnnotatedInterface) -> String {
    format!(
        "{} {} → {} {}",
        i.interface.iml_number,
        i.provider_application_name,
        i.consumer_application_name,
        format!("[{}]", i.interface.status).dimmed()
    )
}

fn process_lines(rows: &[ImpactedProcess]) -> Vec<String> {
    rows.iter()
        .map(|row| {
            let step = row
                .sequence_number
                .map_or_else(String::new, |s| format!(" step {s}"));
            format!(
                "{} ({}, interface #{}{step})",
                process_label(&row.business_process),
                row.impact_type.as_str(),
                row.interface_id
            )
        })
        .collect()
}

fn print_application_impact(report: &ApplicationImpact) {
    let title = match &report.seed {
        ApplicationSeed::Single(app) => format!("application \"{}\"", app.name),
        ApplicationSeed::Many(apps) => format!(
            "{} applications ({})",
            apps.len(),
            apps.iter().map(|a| a.name.as_str()).collect::<Vec<_>>().join(", ")
        ),
    };
    let summary = &report.impact_summary;
    println!(
        "Impact analysis for {} (risk: {}):",
        title.cyan().bold(),
        risk(summary.risk_level)
    );
    println!();

    let provided: Vec<String> = report.provided_interfaces.iter().map(interface_line).collect();
    print_section("Provided interfaces", &provided);
    let consumed: Vec<String> = report.consumed_interfaces.iter().map(interface_line).collect();
    print_section("Consumed interfaces", &consumed);

    let related: Vec<String> = report
        .impacted_applications
        .iter()
        .map(|row| {
            format!(
                "{} ({})",
                row.application.name,
                row.impact.impact_type.as_deref().unwrap_or("related")
            )
        })
        .collect();
    print_section("Related applications", &related);
    print_section(
        "Business processes",
        &process_lines(&report.impacted_business_processes),
    );

    let changes: Vec<String> = report
        .active_change_requests
        .iter()
        .map(|cr| {
            format!(
                "{} {} {}",
                cr.change_request.cr_number,
                cr.change_request.title,
                format!("[{}]", cr.change_request.status).dimmed()
            )
        })
        .collect();
    print_section("Active change requests", &changes);

    println!();
    println!(
        "  {} {} interfaces, {} applications, {} active changes, {} processes",
        "Summary:".white().bold(),
        summary.total_interfaces,
        summary.total_applications,
        summary.active_changes,
        summary.total_business_processes
    );
}

fn print_change_request_impact(report: &ChangeRequestImpact) {
    let title = match &report.seed {
        ChangeRequestSeed::Single(cr) => format!("change request {} \"{}\"", cr.cr_number, cr.title),
        ChangeRequestSeed::Many(crs) => format!(
            "{} change requests ({})",
            crs.len(),
            crs.iter().map(|c| c.cr_number.as_str()).collect::<Vec<_>>().join(", ")
        ),
    };
    let summary = &report.impact_summary;
    println!(
        "Impact analysis for {} (risk: {}):",
        title.cyan().bold(),
        risk(summary.risk_level)
    );
    println!();

    let apps: Vec<String> = report
        .impacted_applications
        .iter()
        .map(|row| {
            format!(
                "{} {}",
                row.application.name,
                row.impact.impact_type.as_deref().unwrap_or_default().dimmed()
            )
        })
        .collect();
    print_section("Applications", &apps);
    let interfaces: Vec<String> = report
        .impacted_interfaces
        .iter()
        .map(|row| interface_line(&row.interface))
        .collect();
    print_section("Interfaces", &interfaces);
    print_section(
        "Business processes",
        &process_lines(&report.impacted_business_processes),
    );
    let technical: Vec<String> = report
        .impacted_technical_processes
        .iter()
        .map(|row| {
            let tp = &row.technical_process;
            match &tp.application_name {
                Some(app) => format!("{} ({app})", tp.technical_process.name),
                None => tp.technical_process.name.clone(),
            }
        })
        .collect();
    print_section("Technical processes", &technical);

    println!();
    println!(
        "  {} {} applications, {} interfaces, {} processes, {} technical processes",
        "Summary:".white().bold(),
        summary.total_applications,
        summary.total_interfaces,
        summary.total_business_processes,
        summary.total_technical_processes
    );
}

fn print_interface_impact(report: &InterfaceImpact) {
    let summary = &report.impact_summary;
    let names: Vec<&str> = report.interfaces.iter().map(|i| i.iml_number.as_str()).collect();
    println!(
        "Impact analysis for {} (risk: {}):",
        format!("interfaces {}", names.join(", ")).cyan().bold(),
        risk(summary.risk_level)
    );
    println!();

    let apps: Vec<String> = report
        .related_applications
        .iter()
        .map(|a| a.name.clone())
        .collect();
    print_section("Related applications", &apps);
    let changes: Vec<String> = report
        .related_change_requests
        .iter()
        .map(|row| {
            format!(
                "{} {} {}",
                row.change_request.cr_number,
                row.change_request.title,
                format!("(interface #{})", row.interface_id).dimmed()
            )
        })
        .collect();
    print_section("Change requests", &changes);
    print_section(
        "Business processes",
        &process_lines(&report.impacted_business_processes),
    );

    println!();
    println!(
        "  {} {} applications, {} processes, {} change requests",
        "Summary:".white().bold(),
        summary.total_applications,
        summary.total_business_processes,
        summary.related_change_requests
    );
}
