//! Notice page extraction
//!
//! Turns the HTML of a notice page into a [`Record`]. Notice pages are a list
//! of `div.field-label` elements, each followed by its value, plus optional
//! titled sections (civil complaint, settlements, corrected settlements and
//! judgments) whose fields live in the element following the section title.
//!
//! Extraction is synchronous and CPU bound. Callers running on the async
//! runtime should move it onto the blocking pool.

use std::collections::HashMap;

use scraper::{node::Node, ElementRef, Html, Selector};

use crate::app::models::{Category, NoticeId, Record};
use crate::constants::columns;
use crate::errors::{ExtractionError, ExtractionResult};

/// Turns a fetched payload into a [`Record`]
pub trait Extractor: Send + Sync + 'static {
    /// Extract the record for `link` from `payload`
    fn extract(&self, link: &str, payload: &str) -> ExtractionResult<Record>;
}

const WITHDRAWN_BANNER: &str = "THIS 60-DAY NOTICE HAS BEEN WITHDRAWN";

/// Main-section fields looked up by their label
const MAIN_LABELS: &[(&str, &str)] = &[
    ("AG Number", "AG Number:"),
    ("Date Filed", "Date Filed:"),
    ("Noticing Party", "Noticing Party:"),
    ("Plaintiff Attorney", "Plaintiff Attorney:"),
    ("Alleged Violators", "Alleged Violators:"),
    ("Chemicals", "Chemicals:"),
    ("Source", "Source:"),
];

fn create_selector(selector: &str) -> ExtractionResult<Selector> {
    Selector::parse(selector).map_err(|_| ExtractionError::InvalidSelector {
        selector: selector.to_string(),
    })
}

/// Compiled selectors, built once per extractor
#[derive(Debug)]
struct Selectors {
    div: Selector,
    field_label: Selector,
    details_label: Selector,
    details: Selector,
    field_item: Selector,
    address_field: Selector,
    mailto: Selector,
    anchor: Selector,
    danger_label: Selector,
}

impl Selectors {
    fn new() -> ExtractionResult<Self> {
        Ok(Self {
            div: create_selector("div")?,
            field_label: create_selector("div.field-label")?,
            details_label: create_selector("div.details-label")?,
            details: create_selector("div.details")?,
            field_item: create_selector("div.field-item")?,
            address_field: create_selector(r#"div[class*="field-name-field-prop65-address"]"#)?,
            mailto: create_selector(r#"a[href*="mailto:"]"#)?,
            anchor: create_selector("a")?,
            danger_label: create_selector("span.label-danger")?,
        })
    }
}

/// Extractor for notice detail pages
#[derive(Debug)]
pub struct NoticePageExtractor {
    selectors: Selectors,
}

impl NoticePageExtractor {
    /// Compile the selectors used for extraction
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::InvalidSelector` if a selector fails to parse
    pub fn new() -> ExtractionResult<Self> {
        Ok(Self {
            selectors: Selectors::new()?,
        })
    }

    fn extract_main(&self, doc: &Html, link: &str, record: &mut Record) {
        for (field, label) in MAIN_LABELS {
            let value = self.labelled_value(doc.root_element(), label);
            record.insert(Category::Main, *field, value);
        }
        record.insert(Category::Main, "Notice PDF", notice_pdf_link(link));

        let withdrawn = doc
            .select(&self.selectors.danger_label)
            .any(|span| element_text(span).contains(WITHDRAWN_BANNER));
        if !withdrawn {
            return;
        }

        record.insert(Category::Main, "Withdrawal Status", "Withdrawn");
        for (field, label) in [
            ("Withdrawal ID", "Withdrawal ID:"),
            ("Withdrawal Date", "Withdrawal Date:"),
        ] {
            let value = self.labelled_value(doc.root_element(), label);
            if !value.is_empty() {
                record.insert(Category::Main, field, value);
            }
        }
        if let Some(letter) = self.withdrawal_letter(doc) {
            record.insert(Category::Main, "Withdrawal Letter", letter);
        }
    }

    /// Markdown link to the withdrawal letter, if the page carries one
    fn withdrawal_letter(&self, doc: &Html) -> Option<String> {
        let label = self.find_label(doc.root_element(), "Withdrawal Letter:")?;
        let value = next_element_sibling(label)?;
        let anchor = value.select(&self.selectors.anchor).next()?;
        let href = anchor.value().attr("href")?;
        Some(format!("[{}]({})", element_text(anchor), href))
    }

    fn extract_sections(&self, doc: &Html, record: &mut Record) {
        let mut headers: HashMap<&str, Vec<ElementRef>> = HashMap::new();
        for div in doc.select(&self.selectors.div) {
            if let Some(title) = own_text(div) {
                if let Some(known) = ["Civil Complaint", "Settlement", "Corrected Settlement", "Judgment"]
                    .into_iter()
                    .find(|t| *t == title.as_str())
                {
                    headers.entry(known).or_default().push(div);
                }
            }
        }

        if let Some(header) = headers.get("Civil Complaint").and_then(|h| h.first()) {
            self.extract_section(*header, Category::CivilComplaint, record);
        }

        let repeated: [(&str, fn(u8) -> Category); 3] = [
            ("Settlement", Category::Settlement),
            ("Corrected Settlement", Category::CorrectedSettlement),
            ("Judgment", Category::Judgment),
        ];
        for (title, category) in repeated {
            let Some(found) = headers.get(title) else {
                continue;
            };
            for (ordinal, header) in (1..=columns::MAX_REPEATED_SECTIONS).zip(found.iter()) {
                self.extract_section(*header, category(ordinal), record);
            }
        }
    }

    fn extract_section(&self, header: ElementRef, category: Category, record: &mut Record) {
        let Some(container) = next_element_in_document(header) else {
            return;
        };
        for field in category.layout_fields() {
            let value = self.section_value(container, &section_label(field));
            record.insert(category, *field, value);
        }
    }

    fn section_value(&self, container: ElementRef, label: &str) -> String {
        match label {
            "Non-Contingent Civil Penalty:" => {
                if let Some(amount) = self.details_amount(container, "Non-Contingent Civil Penalty")
                {
                    return amount;
                }
            }
            "Address:" => {
                if let Some(item) = container
                    .select(&self.selectors.address_field)
                    .next()
                    .and_then(|field| field.select(&self.selectors.field_item).next())
                {
                    return element_text(item);
                }
            }
            "Email Address:" => {
                if let Some(anchor) = container.select(&self.selectors.mailto).next() {
                    return element_text(anchor);
                }
            }
            _ => {}
        }

        let value = self.labelled_value(container, label);
        if !value.is_empty() {
            return value;
        }
        self.details_fallback(container, label, label == "Email Address:")
            .unwrap_or_default()
    }

    /// Text of the first `div.field-label` containing `label`, read from its
    /// next element sibling
    fn labelled_value(&self, scope: ElementRef, label: &str) -> String {
        self.find_label(scope, label)
            .and_then(next_element_sibling)
            .map(element_text)
            .unwrap_or_default()
    }

    fn find_label<'a>(&self, scope: ElementRef<'a>, label: &str) -> Option<ElementRef<'a>> {
        scope
            .select(&self.selectors.field_label)
            .find(|el| own_text(*el).is_some_and(|text| text.contains(label)))
    }

    /// Amount written beside a `div.details` caption inside a `div.details-label`
    fn details_amount(&self, container: ElementRef, caption: &str) -> Option<String> {
        container
            .select(&self.selectors.details_label)
            .find_map(|field| {
                let details = field.select(&self.selectors.details).next()?;
                let details_text = element_text(details);
                if !details_text.contains(caption) {
                    return None;
                }
                Some(
                    element_text(field)
                        .replacen(&details_text, "", 1)
                        .trim()
                        .to_string(),
                )
            })
    }

    /// Value trailing a `div.details` caption in its parent element
    fn details_fallback(
        &self,
        container: ElementRef,
        label: &str,
        prefer_anchor: bool,
    ) -> Option<String> {
        let details = container
            .select(&self.selectors.details)
            .find(|el| own_text(*el).is_some_and(|text| text.contains(label)))?;
        let parent = details.parent().and_then(ElementRef::wrap)?;

        if prefer_anchor {
            if let Some(anchor) = parent.select(&self.selectors.anchor).next() {
                return Some(element_text(anchor));
            }
        }

        if parent.children().count() > 1 {
            let trailing = parent
                .last_child()
                .map(|node| match node.value() {
                    Node::Text(text) => text.trim().to_string(),
                    _ => ElementRef::wrap(node).map(element_text).unwrap_or_default(),
                })
                .unwrap_or_default();
            if !trailing.is_empty() {
                return Some(trailing);
            }
        }

        details
            .next_sibling()
            .map(|node| match node.value() {
                Node::Text(text) => text.trim().to_string(),
                _ => ElementRef::wrap(node).map(element_text).unwrap_or_default(),
            })
            .filter(|text| !text.is_empty())
    }
}

impl Extractor for NoticePageExtractor {
    fn extract(&self, link: &str, payload: &str) -> ExtractionResult<Record> {
        let mut record = Record::new(link)?;
        let doc = Html::parse_document(payload);

        if doc.select(&self.selectors.field_label).next().is_none() {
            return Err(ExtractionError::NoContent {
                link: link.to_string(),
            });
        }

        let link = record.link().to_string();
        self.extract_main(&doc, &link, &mut record);
        self.extract_sections(&doc, &mut record);

        tracing::debug!(
            "Extracted {} categories from {}",
            record.categories().count(),
            link
        );
        Ok(record)
    }
}

/// Label shown on the page for a section field
fn section_label(field: &str) -> String {
    match field {
        "Attorneys Fees and Costs" => "Attorney(s) Fees and Costs:".to_string(),
        f if f.ends_with('?') => f.to_string(),
        f => format!("{}:", f),
    }
}

/// Markdown link to the notice PDF
fn notice_pdf_link(link: &str) -> String {
    let base = link.trim_end_matches('/');
    match NoticeId::from_link(base) {
        Some(id) => format!("[{}.pdf]({}/{}.pdf)", id, base, id),
        None => {
            let name = base.rsplit('/').next().unwrap_or(base);
            format!("[{}.pdf]({}/{}.pdf)", name, base, name)
        }
    }
}

/// Text of an element with surrounding whitespace removed
fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Text of an element whose only child is a text node
fn own_text(element: ElementRef) -> Option<String> {
    let mut children = element.children();
    let first = children.next()?;
    if children.next().is_some() {
        return None;
    }
    first.value().as_text().map(|text| text.trim().to_string())
}

fn next_element_sibling(element: ElementRef) -> Option<ElementRef> {
    element.next_siblings().find_map(ElementRef::wrap)
}

/// First element following `element` in document order, skipping its own subtree
fn next_element_in_document(element: ElementRef) -> Option<ElementRef> {
    let mut current = *element;
    loop {
        if let Some(next) = current.next_siblings().find_map(ElementRef::wrap) {
            return Some(next);
        }
        current = current.parent()?;
    }
}
