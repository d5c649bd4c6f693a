//! Process command - parse a single OCR token dump.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use fapiao_core::invoice::{InvoiceParser, LayoutParser};
use fapiao_core::layout::SegmentName;
use fapiao_core::models::invoice::InvoiceDocument;
use fapiao_core::ocr::TokenSet;

use super::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input token dump (JSON)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Print parse issues and underived fields
    #[arg(long)]
    show_issues: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    /// File extension used when writing into a directory.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );

    pb.set_message("Loading tokens...");
    let tokens = TokenSet::from_file(&args.input)?;
    debug!("Loaded {} tokens", tokens.len());

    pb.set_message("Parsing invoice...");
    let parser = LayoutParser::from_config(&config);
    let document = parser.parse_set(&tokens)?;

    pb.finish_and_clear();

    if args.show_issues {
        let problems = document.validate();
        if problems.is_empty() {
            eprintln!("{} No issues", style("✓").green());
        } else {
            eprintln!("{}", style("Parse issues:").yellow());
            for problem in &problems {
                eprintln!("  - {}", problem);
            }
        }
    }

    let output = format_document(&document, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Render a document in the requested format.
pub fn format_document(document: &InvoiceDocument, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(document)?),
        OutputFormat::Csv => format_document_csv(document),
        OutputFormat::Text => Ok(format_document_text(document)),
    }
}

/// One CSV row per line item, prefixed by the invoice-level fields.
fn format_document_csv(document: &InvoiceDocument) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let columns = document.table.column_names();

    let mut header = vec![
        "layout",
        "invoice_number",
        "issue_date",
        "buyer_name",
        "seller_name",
        "seller_tax_id",
        "total_amount",
    ];
    header.extend(columns.iter().copied());
    wtr.write_record(&header)?;

    let fields = &document.fields;
    let prefix = [
        document.layout.clone().unwrap_or_default(),
        fields.invoice_number.clone().unwrap_or_default(),
        fields.issue_date.map(|d| d.to_string()).unwrap_or_default(),
        fields.buyer.name.clone().unwrap_or_default(),
        fields.seller.name.clone().unwrap_or_default(),
        fields.seller.tax_id.clone().unwrap_or_default(),
        fields.total_amount.map(|a| a.to_string()).unwrap_or_default(),
    ];

    // A header-only or missing table still gets one record, padded to the header width
    if document.table.rows.is_empty() {
        let mut record: Vec<String> = prefix.to_vec();
        record.resize(header.len(), String::new());
        wtr.write_record(&record)?;
    }

    for index in 0..document.table.rows.len() {
        let mut record: Vec<String> = prefix.to_vec();
        record.extend(
            columns
                .iter()
                .map(|col| document.table.cell(index, col).unwrap_or_default().to_string()),
        );
        wtr.write_record(&record)?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

/// Human-readable summary.
pub fn format_document_text(document: &InvoiceDocument) -> String {
    let mut output = String::new();

    let layout = document.layout.as_deref().unwrap_or("unrecognized");
    output.push_str(&format!("Layout: {}\n", layout));
    output.push_str(&format!("Title:  {}\n", document.title.label()));
    if let Some(bounds) = &document.bounds {
        output.push_str(&format!("Bounds: {}\n", bounds));
    }
    output.push('\n');

    let fields = &document.fields;
    if let Some(number) = &fields.invoice_number {
        output.push_str(&format!("Invoice: {}\n", number));
    }
    if let Some(code) = &fields.invoice_code {
        output.push_str(&format!("Code:    {}\n", code));
    }
    if let Some(date) = fields.issue_date {
        output.push_str(&format!("Date:    {}\n", date));
    }

    for (label, party) in [("Buyer", &fields.buyer), ("Seller", &fields.seller)] {
        output.push_str(&format!("\n{}:\n", label));
        output.push_str(&format!("  {}\n", party.name.as_deref().unwrap_or("-")));
        if let Some(tax_id) = &party.tax_id {
            output.push_str(&format!("  Tax ID: {}\n", tax_id));
        }
        if let Some(account) = &party.bank_account {
            output.push_str(&format!("  Bank:   {}\n", account));
        }
    }

    if !document.table.is_empty() {
        output.push_str("\nLine items:\n");
        output.push_str(&format!("  {}\n", document.table.column_names().join(" | ")));
        for row in &document.table.rows {
            let cells: Vec<&str> = document
                .table
                .columns
                .iter()
                .map(|col| row.get(&col.name).and_then(|c| c.as_deref()).unwrap_or(""))
                .collect();
            output.push_str(&format!("  {}\n", cells.join(" | ")));
        }
    }

    output.push('\n');
    if let Some(total) = fields.total_amount {
        output.push_str(&format!("Total: ¥{}\n", total));
    }
    if let Some(tax) = fields.total_tax {
        output.push_str(&format!("Tax:   ¥{}\n", tax));
    }

    if document.layout.is_none() {
        return output;
    }

    output.push_str("\nSegments:\n");
    for name in SegmentName::ALL {
        if let Some(segment) = document.segment(name) {
            output.push_str(&format!(
                "  {:<8} {} tokens, {} fields\n",
                name.as_str(),
                segment.tokens.len(),
                segment.fields.len()
            ));
        }
    }

    output
}
