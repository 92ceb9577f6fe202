use super::Wiring;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::summary::summarize_week;
use crate::errors::{AppError, AppResult};
use crate::utils::colors::{RESET, color_for_overtime};
use crate::utils::date::{parse_date, weekday_short};
use crate::utils::formatting::{bold, decimal_hours};
use crate::utils::mins2readable;
use crate::utils::table::{Column, Table};

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let week = match cmd {
        Commands::Summary { week } => week.clone(),
        _ => None,
    };

    let wiring = Wiring::from_config(cfg)?;
    let day = match week {
        Some(s) => parse_date(&s).ok_or(AppError::InvalidDate(s))?,
        None => wiring.reconciler.time().now().date_naive(),
    };
    let user = cfg.require_user()?;

    let sessions = wiring.reconciler.sessions_for_user(user).await?;
    let summary = summarize_week(&sessions, day, cfg.daily_target_minutes);

    println!(
        "📅 Week of {} for user {}\n",
        bold(&summary.days[0].date.to_string()),
        user
    );

    let mut table = Table::new(vec![
        Column::new("DAY", 4),
        Column::new("DATE", 10),
        Column::new("WORKED", 8),
        Column::new("TARGET", 8),
    ]);
    for d in &summary.days {
        table.add_row(vec![
            weekday_short(d.date).to_string(),
            d.date.to_string(),
            mins2readable(d.worked_minutes, false, false),
            mins2readable(d.target_minutes, false, false),
        ]);
    }
    print!("{}", table.render());

    println!();
    println!(
        "Total     : {} ({} decimal hours)",
        mins2readable(summary.total_minutes, false, false),
        decimal_hours(summary.total_minutes)
    );
    println!("Days      : {}", summary.days_worked);
    println!(
        "Average   : {}",
        mins2readable(summary.average_minutes, false, false)
    );
    println!(
        "Overtime  : {}{}{}",
        color_for_overtime(summary.overtime_minutes),
        mins2readable(summary.overtime_minutes, true, false),
        RESET
    );
    Ok(())
}
