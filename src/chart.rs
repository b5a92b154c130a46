use std::fmt;
use std::path::Path;

use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use rust_decimal::prelude::ToPrimitive;

use crate::decimal::Money;
use crate::errors::{Result, ScheduleError};
use crate::schedule::{AmortizationSchedule, PeriodRecord};

const CHART_SIZE: (u32, u32) = (1000, 600);
const DASH_SIZE: u32 = 6;
const DASH_SPACING: u32 = 4;

/// line chart of balance (blue), cumulative principal (green) and
/// cumulative interest (red) over the schedule, saved as a PNG
pub fn render_schedule_chart(schedule: &AmortizationSchedule, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(axis_x(&[schedule]), axis_y(&[schedule]))
        .map_err(chart_err)?;

    chart
        .draw_series(LineSeries::new(series(schedule, |r| r.ending_balance), &BLUE))
        .map_err(chart_err)?;
    chart
        .draw_series(LineSeries::new(
            series(schedule, |r| r.cumulative_principal),
            &GREEN,
        ))
        .map_err(chart_err)?;
    chart
        .draw_series(LineSeries::new(
            series(schedule, |r| r.cumulative_interest),
            &RED,
        ))
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    log::info!("schedule chart written to {}", path.display());
    Ok(())
}

/// overlay of two schedules: solid series for the baseline, dashed series
/// for the prepayment scenario, one color per quantity
pub fn render_comparison_chart(
    baseline: &AmortizationSchedule,
    prepaid: &AmortizationSchedule,
    path: &Path,
) -> Result<()> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let schedules = [baseline, prepaid];
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(axis_x(&schedules), axis_y(&schedules))
        .map_err(chart_err)?;

    chart
        .draw_series(LineSeries::new(series(baseline, |r| r.ending_balance), &BLUE))
        .map_err(chart_err)?;
    chart
        .draw_series(LineSeries::new(
            series(baseline, |r| r.cumulative_principal),
            &GREEN,
        ))
        .map_err(chart_err)?;
    chart
        .draw_series(LineSeries::new(
            series(baseline, |r| r.cumulative_interest),
            &RED,
        ))
        .map_err(chart_err)?;

    chart
        .draw_series(DashedLineSeries::new(
            series(prepaid, |r| r.ending_balance),
            DASH_SIZE,
            DASH_SPACING,
            ShapeStyle::from(&BLUE),
        ))
        .map_err(chart_err)?;
    chart
        .draw_series(DashedLineSeries::new(
            series(prepaid, |r| r.cumulative_principal),
            DASH_SIZE,
            DASH_SPACING,
            ShapeStyle::from(&GREEN),
        ))
        .map_err(chart_err)?;
    chart
        .draw_series(DashedLineSeries::new(
            series(prepaid, |r| r.cumulative_interest),
            DASH_SIZE,
            DASH_SPACING,
            ShapeStyle::from(&RED),
        ))
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    log::info!("comparison chart written to {}", path.display());
    Ok(())
}

fn series(
    schedule: &AmortizationSchedule,
    value: impl Fn(&PeriodRecord) -> Money,
) -> Vec<(f64, f64)> {
    schedule
        .records
        .iter()
        .map(|r| (r.period_index as f64, to_f64(value(r))))
        .collect()
}

fn axis_x(schedules: &[&AmortizationSchedule]) -> std::ops::Range<f64> {
    let months = schedules
        .iter()
        .map(|s| s.summary.months_used)
        .max()
        .unwrap_or(1)
        .max(1);
    0f64..months as f64 + 1.0
}

fn axis_y(schedules: &[&AmortizationSchedule]) -> std::ops::Range<f64> {
    let top = schedules
        .iter()
        .flat_map(|s| {
            [
                to_f64(s.terms.principal()),
                to_f64(s.summary.total_interest_paid),
            ]
        })
        .fold(0f64, f64::max);
    0f64..(top * 1.05).max(1.0)
}

fn to_f64(amount: Money) -> f64 {
    amount.to_thousands().to_f64().unwrap_or(0.0)
}

fn chart_err(e: impl fmt::Display) -> ScheduleError {
    ScheduleError::Chart {
        message: e.to_string(),
    }
}
