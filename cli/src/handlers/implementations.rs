use anyhow::bail;
use log::{debug, info, warn};

use aiad_storage::{
    db::{DateFilter, Order},
    record::Record,
};

use super::{Command, CommandHandler, Context, printing};

impl CommandHandler for Command {
    type Output = anyhow::Result<()>;

    #[allow(clippy::too_many_lines)]
    fn handle<W1: std::fmt::Write, W2: std::fmt::Write>(
        &self,
        ctx: &Context<'_>,
        stdout: &mut W1,
        stderr: &mut W2,
    ) -> Self::Output {
        match self {
            Self::Save {
                url,
                channel,
                name,
                keywords,
                date,
                force,
            } => {
                let db = ctx.database(channel.as_deref())?;
                let date = date.unwrap_or_else(|| db.next_free_date(ctx.today));
                debug!("saving {url} for {date}");

                let exists = db.exists(date);
                if exists && !force {
                    bail!("wallpaper for date \"{date}\" already exists.");
                }

                let record = ctx.load_record(url, name.as_deref(), keywords.as_deref())?;
                if record.name.is_empty() {
                    bail!("resolved wallpaper has no name, please specify -n,--name");
                }
                if record.keywords.is_empty() {
                    bail!("resolved wallpaper has no keywords, please specify -k,--keywords");
                }

                if exists {
                    let deleted = db.delete(date)?;
                    writeln!(stdout, "Deleted {}", printing::relative(&deleted))?;
                }
                let saved = db.save(date, &record)?;
                writeln!(stdout, "Saved to {}", printing::relative(&saved))?;
                Ok(())
            }
            Self::Resave { dates, channel } => {
                let db = ctx.database(channel.as_deref())?;

                // load every date before resolving anything
                let records = dates
                    .iter()
                    .map(|date| Ok((*date, db.load(*date)?)))
                    .collect::<anyhow::Result<Vec<(_, Record)>>>()?;

                for (date, old) in records {
                    info!("re-resolving {date} from {}", old.source_url);
                    let record = ctx.load_record(
                        &old.source_url,
                        Some(old.name.as_str()),
                        Some(old.keywords.join(",").as_str()),
                    )?;
                    db.delete(date)?;
                    let saved = db.save(date, &record)?;
                    writeln!(stdout, "Saved to {}", printing::relative(&saved))?;
                }
                Ok(())
            }
            Self::Resolve { url } => {
                let record = ctx.load_record(url, None, None)?;
                writeln!(stdout, "{}", record.to_json_pretty()?)?;
                Ok(())
            }
            Self::Validate { files } => {
                writeln!(stdout, "Checking {} wallpaper file(s) ...", files.len())?;
                let mut failed = 0;
                for file in files {
                    let result = Record::load_from_file(file);
                    if result.is_err() {
                        failed += 1;
                    }
                    writeln!(stdout, "{}", printing::validation(file, &result))?;
                }
                if failed > 0 {
                    bail!("{failed} of {} wallpaper file(s) are invalid", files.len());
                }
                Ok(())
            }
            Self::List {
                channel,
                year,
                month,
                reverse,
            } => {
                let db = ctx.database(channel.as_deref())?;
                let order = if *reverse {
                    Order::Descending
                } else {
                    Order::Ascending
                };

                let mut count = 0;
                for date in db.all(DateFilter::new(*year, *month).order(order)) {
                    match db.load(date) {
                        Ok(record) => {
                            count += 1;
                            writeln!(stdout, "{}", printing::wallpaper(date, &record)?)?;
                        }
                        Err(e) => {
                            warn!("skipping {date}: {e}");
                            writeln!(stderr, "{date}  {e}")?;
                        }
                    }
                }
                if count == 0 {
                    writeln!(stderr, "No wallpapers found.")?;
                }
                Ok(())
            }
            Self::Channels => {
                ctx.ensure_root()?;
                for name in ctx.channels.names() {
                    writeln!(stdout, "{name}")?;
                }
                Ok(())
            }
        }
    }
}
