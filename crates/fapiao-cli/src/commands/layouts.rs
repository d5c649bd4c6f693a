//! Layouts command - list the active layout catalog.

use clap::Args;
use console::style;

use fapiao_core::layout::SegmentName;

use super::load_config;

/// Arguments for the layouts command.
#[derive(Args)]
pub struct LayoutsArgs {
    /// Print the catalog as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: LayoutsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let catalog = config.catalog();

    if args.json {
        println!("{}", serde_json::to_string_pretty(catalog.as_ref())?);
        return Ok(());
    }

    println!("{}", style("Known invoice layouts (checked in order):").bold());
    println!();

    for (i, variant) in catalog.variants.iter().enumerate() {
        println!(
            "  {}. {} (keyword {:?})",
            i + 1,
            style(&variant.name).cyan(),
            variant.keyword
        );
        println!(
            "     bounds: top at {:?}, bottom at {:?}",
            variant.title_marker, variant.total_marker
        );

        for name in SegmentName::ALL {
            match variant.segment(name) {
                Some(template) => {
                    let r = template.rect;
                    let fields = if template.required_fields.is_empty() {
                        String::new()
                    } else {
                        format!("  [{}]", template.required_fields.join(", "))
                    };
                    println!(
                        "     {:<8} {:>3}% {:>3}% {:>3}% {:>3}%{}",
                        name.as_str(),
                        r.left,
                        r.top,
                        r.right,
                        r.bottom,
                        fields
                    );
                }
                None => println!("     {:<8} {}", name.as_str(), style("(none)").dim()),
            }
        }
        println!();
    }

    Ok(())
}
