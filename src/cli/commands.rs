use url::Url;

use crate::app::{AppContext, AppError, Result};
use crate::domain::{Category, FeedSource, SubCategory};
use crate::scheduler::{format_interval, parse_interval};
use crate::store::Store;

/// Attributes of a source as given on the command line.
pub struct NewSource {
    pub url: String,
    pub name: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub language: String,
    pub site_url: Option<String>,
}

pub fn add_source(ctx: &AppContext, new: NewSource) -> Result<()> {
    let url = Url::parse(new.url.trim())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Other(format!(
            "Unsupported URL scheme: {}",
            url.scheme()
        )));
    }
    let url = url.to_string();

    if let Some(existing) = ctx.store.get_source_by_url(&url)? {
        if !existing.removed {
            return Err(AppError::SourceExists(url));
        }
    }

    let site_url = match new.site_url {
        Some(site) => Some(Url::parse(site.trim())?.to_string()),
        None => None,
    };

    let mut source = FeedSource::new(
        new.name.trim(),
        url.as_str(),
        Category::named(new.category.trim()),
    );
    source.subcategory = new
        .subcategory
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(SubCategory::named);
    source.language = new.language.trim().to_string();
    source.site_url = site_url;

    ctx.store.add_source(&source)?;
    println!("Added source: {} ({})", source.display_name(), url);
    Ok(())
}

pub fn remove_source(ctx: &AppContext, url: &str) -> Result<()> {
    // Sources are stored in parsed form; fall back to the raw text for legacy rows.
    let url = url.trim();
    let parsed = Url::parse(url).map(|u| u.to_string()).ok();
    match parsed.as_deref() {
        Some(normalized) if ctx.store.get_source_by_url(normalized)?.is_some() => {
            ctx.store.remove_source(normalized)?
        }
        _ => ctx.store.remove_source(url)?,
    }
    println!("Removed source: {}", url);
    Ok(())
}

pub fn list_sources(ctx: &AppContext, all: bool) -> Result<()> {
    let sources = if all {
        ctx.store.list_sources()?
    } else {
        ctx.store.active_sources()?
    };

    if sources.is_empty() {
        println!("No sources");
        return Ok(());
    }

    for source in sources {
        let category = match &source.subcategory {
            Some(sub) => format!("{} / {}", source.category.name, sub.name),
            None => source.category.name.clone(),
        };
        let marker = if source.removed { " (removed)" } else { "" };
        println!(
            "{} [{}] {}{}\n  {}",
            source.display_name(),
            category,
            source.language,
            marker,
            source.url
        );
    }

    Ok(())
}

pub fn list_items(ctx: &AppContext, limit: usize, json: bool) -> Result<()> {
    let items = ctx.store.list_items(limit)?;

    if json {
        for item in &items {
            let line = serde_json::to_string(item)
                .map_err(|e| AppError::Other(format!("Failed to encode item: {}", e)))?;
            println!("{}", line);
        }
        return Ok(());
    }

    if items.is_empty() {
        println!("No items");
        return Ok(());
    }

    for item in items {
        let date = item
            .published_at
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| " ".repeat(16));
        println!("{} [{}] {}\n  {}", date, item.source, item.title, item.link);
    }

    Ok(())
}

pub async fn update(ctx: &AppContext) -> Result<()> {
    let report = ctx.scheduler().run_once().await?;

    if report.dispatched == 0 {
        println!("No sources to update");
    } else {
        println!("Update complete: {}", report);
    }
    Ok(())
}

pub async fn run(ctx: &AppContext, interval: Option<&str>, no_initial_update: bool) -> Result<()> {
    let mut scheduler = ctx.scheduler();
    let mut secs = ctx.config.schedule.interval_secs;

    if let Some(interval) = interval {
        secs = parse_interval(interval).map_err(AppError::Other)?;
        scheduler = scheduler.with_interval(secs);
    }
    if no_initial_update {
        scheduler = scheduler.with_run_on_start(false);
    }

    println!(
        "Running every {} (PID {}). Press Ctrl-C to stop.",
        format_interval(secs),
        std::process::id()
    );
    scheduler.run().await
}
