use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use crate::compose::{self, ItemGroups, SectionPlan};
use crate::config::Config;
use crate::error::QuoteError;
use crate::models::{LineItem, Quote};

/// Service for generating quote documents in Markdown and PDF format
pub struct QuoteGenerator {
    output_dir: PathBuf,
    company_name: String,
    company_tagline: String,
}

fn money(value: f64) -> String {
    if value < 0.0 {
        format!("-${:.2}", -value)
    } else {
        format!("${:.2}", value)
    }
}

impl QuoteGenerator {
    pub fn new(config: &Config) -> Result<Self, QuoteError> {
        let output_dir = PathBuf::from(&config.output_dir);
        if !output_dir.exists() {
            fs::create_dir_all(&output_dir)
                .map_err(|e| QuoteError::Document(format!("cannot create output dir: {}", e)))?;
        }

        Ok(Self {
            output_dir,
            company_name: config.company_name.clone(),
            company_tagline: config.company_tagline.clone(),
        })
    }

    /// Generate a Markdown quote file and convert it to PDF using pandoc
    /// if available. Returns the Markdown and PDF paths.
    pub fn generate(&self, quote: &Quote) -> Result<(PathBuf, PathBuf), QuoteError> {
        let markdown = self.markdown(quote);

        let stem = quote.file_stem();
        let md_path = self.output_dir.join(format!("{}.md", stem));
        let pdf_path = self.output_dir.join(format!("{}.pdf", stem));

        let mut file = File::create(&md_path)
            .map_err(|e| QuoteError::Document(format!("cannot write {}: {}", md_path.display(), e)))?;
        file.write_all(markdown.as_bytes())
            .map_err(|e| QuoteError::Document(format!("cannot write {}: {}", md_path.display(), e)))?;

        // Rasterization is delegated to pandoc; when it is missing or
        // fails we fall back to a plain copy so the export still
        // produces both files.
        let pdf_result = Command::new("pandoc")
            .arg(&md_path)
            .arg("-o")
            .arg(&pdf_path)
            .output();

        match pdf_result {
            Ok(output) if output.status.success() => {
                debug!(path = %pdf_path.display(), "pandoc rendered quote PDF");
            }
            Ok(output) => {
                let error = String::from_utf8_lossy(&output.stderr);
                warn!("pandoc failed to generate PDF: {}", error.trim());
                self.create_markdown_copy(&md_path, &pdf_path)?;
            }
            Err(e) => {
                warn!("could not run pandoc: {}", e);
                self.create_markdown_copy(&md_path, &pdf_path)?;
            }
        }

        Ok((md_path, pdf_path))
    }

    /// Create a copy of the markdown file under the PDF name as fallback
    fn create_markdown_copy(&self, md_path: &Path, pdf_path: &Path) -> Result<(), QuoteError> {
        let content = fs::read_to_string(md_path)
            .map_err(|e| QuoteError::Document(format!("cannot read {}: {}", md_path.display(), e)))?;

        let mut file = File::create(pdf_path)
            .map_err(|e| QuoteError::Document(format!("cannot write {}: {}", pdf_path.display(), e)))?;
        file.write_all(content.as_bytes())
            .map_err(|e| QuoteError::Document(format!("cannot write {}: {}", pdf_path.display(), e)))?;

        Ok(())
    }

    /// Generate Markdown content for the quote document
    fn markdown(&self, quote: &Quote) -> String {
        let plan = compose::section_plan(quote);
        let groups = compose::partition(&quote.items);

        let mut content = String::new();

        // Top divider
        content.push_str("<hr style=\"height: 5px; background-color: #343876; border: none;\">\n\n");

        if !self.company_name.is_empty() {
            content.push_str(&format!("# {}\n", self.company_name));
            if !self.company_tagline.is_empty() {
                content.push_str(&format!("{}\n", self.company_tagline));
            }
            content.push('\n');
        }

        let kind = quote.kind.to_string().to_uppercase();
        content.push_str(&format!("# TECHNICAL QUOTE — {}\n", kind));
        content.push_str(&format!("**Quote #** {}<br>\n", quote.number));
        content.push_str(&format!(
            "**Date:** {}<br>\n",
            quote.issue_date.format("%m/%d/%Y")
        ));
        content.push_str(&format!("**Valid for:** {} days<br>\n", quote.validity_days));
        if let Some(until) = compose::valid_until(quote) {
            content.push_str(&format!("**Valid until:** {}<br>\n", until.format("%m/%d/%Y")));
        }
        if !quote.delivery_estimate.trim().is_empty() {
            content.push_str(&format!("**Delivery estimate:** {}<br>\n", quote.delivery_estimate));
        }
        content.push_str(&format!("**Total hours:** {}h\n\n", quote.total_hours));

        // Client block
        content.push_str("**Quote for**<br>\n");
        content.push_str(&format!("{}<br>\n", quote.client.name));
        if !quote.client.company.is_empty() {
            content.push_str(&format!("{}<br>\n", quote.client.company));
        }
        content.push_str(&format!("{}<br>\n", quote.client.email));
        content.push_str(&format!("{}<br>\n", quote.client.phone));
        if !quote.client.address.is_empty() {
            content.push_str(&format!("{}<br>\n", quote.client.address));
        }
        content.push_str("\n<hr>\n\n");

        if let Some(num) = plan.project {
            content.push_str(&format!("## {}. Project\n", num));
            content.push_str(&format!("### {}\n\n", quote.project.title));
            let mut sub = 1;
            for (heading, text) in [
                ("Introduction", &quote.project.introduction),
                ("Development", &quote.project.development),
                ("Conclusion", &quote.project.conclusion),
            ] {
                if !text.trim().is_empty() {
                    content.push_str(&format!("#### {}.{} {}\n{}\n\n", num, sub, heading, text));
                    sub += 1;
                }
            }
        }

        content.push_str(&format!(
            "## {}. Technical Development — Full Breakdown\n\n",
            plan.development
        ));
        self.push_group(&mut content, plan.development, 1, "Backend", &groups.backend);
        self.push_group(&mut content, plan.development, 2, "Frontend", &groups.frontend);

        if let Some(num) = plan.costs {
            content.push_str(&format!("## {}. Operational Costs\n\n", num));
            for cost in &quote.operational_costs {
                content.push_str(&format!(
                    "- **{}** ({}): {}\n",
                    cost.description,
                    cost.periodicity,
                    money(cost.amount)
                ));
            }
            content.push('\n');
        }

        if let Some(num) = plan.revenue {
            content.push_str(&format!("## {}. Revenue Model\n{}\n\n", num, quote.revenue_model));
        }

        self.push_summary_table(&mut content, &plan, &groups, quote);
        self.push_totals(&mut content, quote);

        if let Some(num) = plan.notes {
            content.push_str(&format!("## {}. Additional Notes\n{}\n\n", num, quote.notes));
        }

        content.push_str(&format!("## {}. Terms & Conditions\n{}\n\n", plan.terms, quote.terms));

        content.push_str("<hr>\n\n");
        content.push_str("Thank you for trusting us with your project!\n");
        if !self.company_name.is_empty() {
            content.push_str(&format!("**{}**\n", self.company_name));
        }

        content
    }

    fn push_group(
        &self,
        content: &mut String,
        section: u32,
        group_no: u32,
        title: &str,
        items: &[&LineItem],
    ) {
        if items.is_empty() {
            return;
        }

        content.push_str(&format!("### {}.{} {}\n\n", section, group_no, title));
        for (index, item) in items.iter().enumerate() {
            content.push_str(&format!(
                "#### {}.{}.{} {}\n",
                section,
                group_no,
                index + 1,
                item.description
            ));
            content.push_str(&format!(
                "<span style=\"color: #e83e8c;\">{}h · {}/h · {}</span>\n",
                item.hours,
                money(item.hourly_rate),
                money(item.total)
            ));
            if !item.details.trim().is_empty() {
                content.push_str(&format!("\n{}\n", item.details));
            }
            content.push('\n');
        }
    }

    fn push_summary_table(
        &self,
        content: &mut String,
        plan: &SectionPlan,
        groups: &ItemGroups<'_>,
        quote: &Quote,
    ) {
        content.push_str(&format!("## {}. Effort Summary\n\n", plan.summary));
        content.push_str("<table style=\"width: 100%; border-collapse: collapse;\">\n");
        content.push_str("<tr>\n");
        content.push_str("<th style=\"text-align: left;\">Part</th>\n");
        content.push_str("<th style=\"text-align: right;\">Hours</th>\n");
        content.push_str("<th style=\"text-align: left;\">Deliverables</th>\n");
        content.push_str("</tr>\n");

        for (title, items) in [("Backend", &groups.backend), ("Frontend", &groups.frontend)] {
            if items.is_empty() {
                continue;
            }
            content.push_str("<tr>\n");
            content.push_str(&format!("<td style=\"text-align: left;\"><b>{}</b></td>\n", title));
            content.push_str(&format!(
                "<td style=\"text-align: right;\">{}h</td>\n",
                compose::group_hours(items)
            ));
            content.push_str(&format!(
                "<td style=\"text-align: left;\">{}</td>\n",
                compose::deliverables_digest(items)
            ));
            content.push_str("</tr>\n");
        }

        content.push_str("<tr>\n");
        content.push_str("<td style=\"text-align: left;\"><b>Total</b></td>\n");
        content.push_str(&format!(
            "<td style=\"text-align: right;\"><b>{}h</b></td>\n",
            quote.total_hours
        ));
        content.push_str("<td style=\"text-align: left;\"><b>Complete system</b></td>\n");
        content.push_str("</tr>\n");
        content.push_str("</table>\n\n");
    }

    fn push_totals(&self, content: &mut String, quote: &Quote) {
        content.push_str("<table style=\"width: 40%; margin-left: auto;\">\n");
        content.push_str(&format!(
            "<tr><td>Subtotal</td><td style=\"text-align: right;\">{}</td></tr>\n",
            money(quote.subtotal)
        ));
        if quote.discount > 0.0 {
            content.push_str(&format!(
                "<tr><td>Discount</td><td style=\"text-align: right;\">- {}</td></tr>\n",
                money(quote.discount)
            ));
        }
        content.push_str(&format!(
            "<tr><td><b>TOTAL</b></td><td style=\"text-align: right; font-weight: bold; color: #e83e8c;\"><h2>{}</h2></td></tr>\n",
            money(quote.total)
        ));
        content.push_str("</table>\n\n");
    }
}

/// Plain-text rendering of the composed document, used by the preview
/// screen and the `print` subcommand.
pub fn render_text(quote: &Quote) -> String {
    let plan = compose::section_plan(quote);
    let groups = compose::partition(&quote.items);

    let mut out = String::new();
    let kind = quote.kind.to_string().to_uppercase();

    let _ = writeln!(out, "TECHNICAL QUOTE — {}    No. {}", kind, quote.number);
    let _ = writeln!(out, "Date: {}", quote.issue_date.format("%m/%d/%Y"));
    let _ = writeln!(out, "Valid for: {} days", quote.validity_days);
    if let Some(until) = compose::valid_until(quote) {
        let _ = writeln!(out, "Valid until: {}", until.format("%m/%d/%Y"));
    }
    if !quote.delivery_estimate.trim().is_empty() {
        let _ = writeln!(out, "Delivery estimate: {}", quote.delivery_estimate);
    }
    let _ = writeln!(out, "Total hours: {}h", quote.total_hours);
    out.push('\n');

    let _ = writeln!(out, "Quote for: {}", quote.client.name);
    if !quote.client.company.is_empty() {
        let _ = writeln!(out, "Company:   {}", quote.client.company);
    }
    let _ = writeln!(out, "Email:     {}", quote.client.email);
    let _ = writeln!(out, "Phone:     {}", quote.client.phone);
    if !quote.client.address.is_empty() {
        let _ = writeln!(out, "Address:   {}", quote.client.address);
    }
    out.push_str("\n----------------------------------------\n\n");

    if let Some(num) = plan.project {
        let _ = writeln!(out, "{}. PROJECT — {}", num, quote.project.title);
        let mut sub = 1;
        for (heading, text) in [
            ("Introduction", &quote.project.introduction),
            ("Development", &quote.project.development),
            ("Conclusion", &quote.project.conclusion),
        ] {
            if !text.trim().is_empty() {
                let _ = writeln!(out, "\n{}.{} {}\n{}", num, sub, heading, text);
                sub += 1;
            }
        }
        out.push('\n');
    }

    let _ = writeln!(out, "{}. TECHNICAL DEVELOPMENT — FULL BREAKDOWN", plan.development);
    for (group_no, title, items) in [
        (1, "Backend", &groups.backend),
        (2, "Frontend", &groups.frontend),
    ] {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{}.{} {}", plan.development, group_no, title);
        for (index, item) in items.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {}.{}.{} {}  [{}h · {}/h · {}]",
                plan.development,
                group_no,
                index + 1,
                item.description,
                item.hours,
                money(item.hourly_rate),
                money(item.total)
            );
            if !item.details.trim().is_empty() {
                let _ = writeln!(out, "      {}", item.details);
            }
        }
    }
    out.push('\n');

    if let Some(num) = plan.costs {
        let _ = writeln!(out, "{}. OPERATIONAL COSTS", num);
        for cost in &quote.operational_costs {
            let _ = writeln!(
                out,
                "  - {} ({}): {}",
                cost.description,
                cost.periodicity,
                money(cost.amount)
            );
        }
        out.push('\n');
    }

    if let Some(num) = plan.revenue {
        let _ = writeln!(out, "{}. REVENUE MODEL\n{}\n", num, quote.revenue_model);
    }

    let _ = writeln!(out, "{}. EFFORT SUMMARY", plan.summary);
    for (title, items) in [("Backend", &groups.backend), ("Frontend", &groups.frontend)] {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(
            out,
            "  {:<10} {:>6}h  {}",
            title,
            compose::group_hours(items),
            compose::deliverables_digest(items)
        );
    }
    let _ = writeln!(out, "  {:<10} {:>6}h  Complete system", "Total", quote.total_hours);
    out.push('\n');

    let _ = writeln!(out, "Subtotal: {}", money(quote.subtotal));
    if quote.discount > 0.0 {
        let _ = writeln!(out, "Discount: - {}", money(quote.discount));
    }
    let _ = writeln!(out, "TOTAL:    {}", money(quote.total));
    out.push('\n');

    if let Some(num) = plan.notes {
        let _ = writeln!(out, "{}. ADDITIONAL NOTES\n{}\n", num, quote.notes);
    }

    let _ = writeln!(out, "{}. TERMS & CONDITIONS\n{}", plan.terms, quote.terms);
    out.push_str("\nThank you for trusting us with your project!\n");

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineItem;
    use tempfile::TempDir;

    fn sample_quote() -> Quote {
        let mut api = LineItem::new("backend-1", "REST API");
        api.description = "Order API".to_string();
        api.hours = 40.0;
        api.hourly_rate = 100.0;
        api.recalc_from_time();

        let mut ui = LineItem::new("frontend-1", "Web Interface");
        ui.description = "Checkout screens".to_string();
        ui.hours = 24.0;
        ui.hourly_rate = 90.0;
        ui.recalc_from_time();

        let mut quote = Quote {
            number: "QTE-1".to_string(),
            items: vec![api, ui],
            subtotal: 6160.0,
            total: 6160.0,
            total_hours: 64.0,
            terms: "Net 30.".to_string(),
            ..Quote::default()
        };
        quote.client.name = "Acme Ltda".to_string();
        quote.project.title = "Checkout Revamp".to_string();
        quote
    }

    fn generator(dir: &TempDir) -> QuoteGenerator {
        let config = Config {
            output_dir: dir.path().join("out").to_string_lossy().into_owned(),
            ..Config::default()
        };
        QuoteGenerator::new(&config).unwrap()
    }

    #[test]
    fn generate_writes_markdown_and_a_pdf_artifact() {
        let dir = TempDir::new().unwrap();
        let (md_path, pdf_path) = generator(&dir).generate(&sample_quote()).unwrap();

        // The markdown is always real; the pdf is either pandoc output
        // or the fallback copy, but the file must exist either way.
        assert!(md_path.exists());
        assert!(pdf_path.exists());

        let markdown = std::fs::read_to_string(&md_path).unwrap();
        assert!(markdown.contains("TECHNICAL QUOTE — FINAL"));
        assert!(markdown.contains("1. Project"));
        assert!(markdown.contains("2.1.1 Order API"));
        assert!(markdown.contains("2.2.1 Checkout screens"));
    }

    #[test]
    fn file_names_follow_the_project_title_slug() {
        let dir = TempDir::new().unwrap();
        let (md_path, _) = generator(&dir).generate(&sample_quote()).unwrap();
        assert_eq!(
            md_path.file_name().and_then(|n| n.to_str()),
            Some("checkout-revamp.md")
        );
    }

    #[test]
    fn text_rendering_numbers_sections_by_presence() {
        let mut quote = sample_quote();
        quote.project.title.clear();
        quote.notes = "Kickoff in March.".to_string();

        let text = render_text(&quote);
        assert!(text.contains("1. TECHNICAL DEVELOPMENT"));
        assert!(text.contains("2. EFFORT SUMMARY"));
        assert!(text.contains("3. ADDITIONAL NOTES"));
        assert!(text.contains("4. TERMS & CONDITIONS"));
        assert!(!text.contains("PROJECT —"));
    }

    #[test]
    fn negative_totals_render_with_a_leading_sign() {
        assert_eq!(money(-150.0), "-$150.00");
        assert_eq!(money(99.5), "$99.50");
    }
}
