use chrono::{Local, TimeZone};
use comfy_table::{Attribute, Cell, CellAlignment, Table, modifiers, presets};

use crate::{
    core::{
        SessionBreakdown,
        pricing::PriceBook,
        report::Report,
        session::Session,
    },
    quantity::{cost::Cost, energy::KilowattHours},
};

fn base_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table.set_header(header.to_vec());
    table
}

fn energy_cell(energy: KilowattHours) -> Cell {
    Cell::new(format!("{:.3}", energy.0)).set_alignment(CellAlignment::Right)
}

fn cost_cell(cost: Cost) -> Cell {
    Cell::new(format!("{:.2}", cost.0)).set_alignment(CellAlignment::Right)
}

fn local_time(timestamp: i64) -> String {
    Local
        .timestamp_opt(timestamp, 0)
        .single()
        .map_or_else(|| timestamp.to_string(), |at| at.format("%Y-%m-%d %H:%M").to_string())
}

pub fn build_report_table(report: &Report) -> Table {
    let mut table =
        base_table(&["Period", "Energy (kWh)", "Tariff (DKK)", "Spot (DKK)", "Price (DKK)"]);
    for bucket in &report.buckets {
        table.add_row(vec![
            Cell::new(&bucket.label),
            energy_cell(bucket.energy.into()),
            cost_cell(bucket.tariff_price),
            cost_cell(bucket.spot_price),
            cost_cell(bucket.price),
        ]);
    }
    let totals = report.totals();
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        energy_cell(totals.energy.into()).add_attribute(Attribute::Bold),
        cost_cell(totals.tariff_price).add_attribute(Attribute::Bold),
        cost_cell(totals.spot_price).add_attribute(Attribute::Bold),
        cost_cell(totals.price).add_attribute(Attribute::Bold),
    ]);
    table
}

pub fn build_sessions_table(rows: &[(&Session, Option<&SessionBreakdown>)]) -> Table {
    let mut table = base_table(&[
        "Session", "Charger", "Group", "User", "Start", "End", "Energy (kWh)", "Tariff (DKK)",
        "Spot (DKK)", "Price (DKK)",
    ]);
    for (session, breakdown) in rows {
        let mut row = vec![
            Cell::new(&session.session_id),
            Cell::new(if session.charger_alias.is_empty() {
                &session.charger_id
            } else {
                &session.charger_alias
            }),
            Cell::new(&session.group_id),
            Cell::new(&session.user_name),
            Cell::new(local_time(session.start_time)),
            match session.end_time {
                Some(end_time) => Cell::new(local_time(end_time)),
                None => Cell::new("(live)").add_attribute(Attribute::Dim),
            },
            energy_cell(session.energy_meter.into()),
        ];
        match breakdown {
            Some(breakdown) => row.extend([
                cost_cell(breakdown.tariff_price),
                cost_cell(breakdown.spot_price),
                cost_cell(breakdown.price),
            ]),
            None => row.extend([Cell::new("-"), Cell::new("-"), Cell::new("-")]),
        }
        table.add_row(row);
    }
    table
}

pub fn build_breakdown_table(breakdown: &SessionBreakdown) -> Table {
    let mut table =
        base_table(&["Hour", "Energy (kWh)", "Tariff (DKK)", "Spot (DKK)", "Price (DKK)"]);
    for bucket in &breakdown.hourly {
        table.add_row(vec![
            Cell::new(local_time(bucket.period_start)),
            energy_cell(bucket.energy.into()),
            cost_cell(bucket.tariff_price),
            cost_cell(bucket.spot_price),
            cost_cell(bucket.price),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        energy_cell(breakdown.energy.into()).add_attribute(Attribute::Bold),
        cost_cell(breakdown.tariff_price).add_attribute(Attribute::Bold),
        cost_cell(breakdown.spot_price).add_attribute(Attribute::Bold),
        cost_cell(breakdown.price).add_attribute(Attribute::Bold),
    ]);
    table
}

pub fn build_price_table(book: &PriceBook) -> Table {
    let mut table = base_table(&["Zone", "Hour", "Spot (DKK/kWh)"]);
    for (zone, hour_start, rate) in book.iter() {
        table.add_row(vec![
            Cell::new(zone),
            Cell::new(local_time(hour_start)),
            Cell::new(format!("{:.5}", rate.0)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
