//! Static accessibility checks over a parsed HTML document.
//!
//! Codes and messages follow HTML_CodeSniffer's WCAG2AA sniffs so that
//! builtin reports line up with pa11y reports for the same defects.

use crate::domain::{Issue, IssueType};
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

fn selector(css: &str) -> Selector {
    // Only called with the literal selectors below.
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e:?}"))
}

static IMG: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static HTML: LazyLock<Selector> = LazyLock::new(|| selector("html"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static FORM_CONTROL: LazyLock<Selector> = LazyLock::new(|| selector("input, select, textarea"));
static LABEL_FOR: LazyLock<Selector> = LazyLock::new(|| selector("label[for]"));
static LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static BUTTON: LazyLock<Selector> = LazyLock::new(|| selector("button"));
static WITH_ID: LazyLock<Selector> = LazyLock::new(|| selector("[id]"));

/// Input types that need no label.
const UNLABELLED_INPUT_TYPES: &[&str] = &["hidden", "submit", "reset", "button", "image"];

/// A single check run against a document.
pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, document: &Html) -> Vec<Issue>;
}

/// All builtin rules, in report order.
#[must_use]
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(DocumentLanguage),
        Box::new(DocumentTitle),
        Box::new(ImageAlt),
        Box::new(FormLabel),
        Box::new(LinkContent),
        Box::new(ButtonName),
        Box::new(DuplicateId),
    ]
}

/// Parse `html` and run `rules` over it.
#[must_use]
pub fn analyze(html: &str, rules: &[Box<dyn Rule>]) -> Vec<Issue> {
    let document = Html::parse_document(html);
    rules.iter().flat_map(|rule| rule.check(&document)).collect()
}

/// WCAG 3.1.1: `<html>` carries a language.
pub struct DocumentLanguage;

impl Rule for DocumentLanguage {
    fn name(&self) -> &'static str {
        "document-language"
    }

    fn check(&self, document: &Html) -> Vec<Issue> {
        let Some(html) = document.select(&HTML).next() else {
            return Vec::new();
        };
        let has_lang = ["lang", "xml:lang"]
            .iter()
            .any(|attr| non_empty_attr(html, attr).is_some());
        if has_lang {
            return Vec::new();
        }
        vec![
            Issue::new(
                "WCAG2AA.Principle3.Guideline3_1.3_1_1.H57.2",
                IssueType::Error,
                "The html element should have a lang or xml:lang attribute which describes the language of the document.",
            )
            .with_context(opening_tag(html))
            .with_selector("html"),
        ]
    }
}

/// WCAG 2.4.2: the document has a non-empty title.
pub struct DocumentTitle;

impl Rule for DocumentTitle {
    fn name(&self) -> &'static str {
        "document-title"
    }

    fn check(&self, document: &Html) -> Vec<Issue> {
        match document.select(&TITLE).next() {
            None => vec![
                Issue::new(
                    "WCAG2AA.Principle2.Guideline2_4.2_4_2.H25.1.NoTitleEl",
                    IssueType::Error,
                    "A title should be provided for the document, using a non-empty title element in the head section.",
                )
                .with_selector("html > head"),
            ],
            Some(title) if text_of(title).is_empty() => vec![
                Issue::new(
                    "WCAG2AA.Principle2.Guideline2_4.2_4_2.H25.1.EmptyTitle",
                    IssueType::Error,
                    "The title element in the head section should be non-empty.",
                )
                .with_context(title.html())
                .with_selector(css_path(title)),
            ],
            Some(_) => Vec::new(),
        }
    }
}

/// WCAG 1.1.1: every `<img>` has an `alt` attribute.
pub struct ImageAlt;

impl Rule for ImageAlt {
    fn name(&self) -> &'static str {
        "image-alt"
    }

    fn check(&self, document: &Html) -> Vec<Issue> {
        document
            .select(&IMG)
            .filter(|img| img.value().attr("alt").is_none())
            .map(|img| {
                Issue::new(
                    "WCAG2AA.Principle1.Guideline1_1.1_1_1.H37",
                    IssueType::Error,
                    "Img element missing an alt attribute. Use the alt attribute to specify a short text alternative.",
                )
                .with_context(img.html())
                .with_selector(css_path(img))
            })
            .collect()
    }
}

/// WCAG 1.3.1: form controls are labelled.
pub struct FormLabel;

impl Rule for FormLabel {
    fn name(&self) -> &'static str {
        "form-label"
    }

    fn check(&self, document: &Html) -> Vec<Issue> {
        let labelled_ids: HashSet<&str> = document
            .select(&LABEL_FOR)
            .filter_map(|label| label.value().attr("for"))
            .collect();

        document
            .select(&FORM_CONTROL)
            .filter(|control| needs_label(*control))
            .filter(|control| {
                let by_for = control
                    .value()
                    .id()
                    .is_some_and(|id| labelled_ids.contains(id));
                let wrapped = control
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .any(|el| el.value().name() == "label");
                !(by_for || wrapped || has_aria_name(*control))
            })
            .map(|control| {
                Issue::new(
                    "WCAG2AA.Principle1.Guideline1_3.1_3_1.F68",
                    IssueType::Error,
                    "This form field should be labelled in some way. Use the label element (either with a \"for\" attribute or wrapped around the form field), or \"title\", \"aria-label\" or \"aria-labelledby\" attributes as appropriate.",
                )
                .with_context(control.html())
                .with_selector(css_path(control))
            })
            .collect()
    }
}

/// WCAG 4.1.2: links have content.
pub struct LinkContent;

impl Rule for LinkContent {
    fn name(&self) -> &'static str {
        "link-content"
    }

    fn check(&self, document: &Html) -> Vec<Issue> {
        document
            .select(&LINK)
            .filter(|link| !has_accessible_name(*link))
            .map(|link| {
                Issue::new(
                    "WCAG2AA.Principle4.Guideline4_1.4_1_2.H91.A.NoContent",
                    IssueType::Error,
                    "Anchor element found with a valid href attribute, but no link content has been supplied.",
                )
                .with_context(link.html())
                .with_selector(css_path(link))
            })
            .collect()
    }
}

/// WCAG 4.1.2: buttons have a name.
pub struct ButtonName;

impl Rule for ButtonName {
    fn name(&self) -> &'static str {
        "button-name"
    }

    fn check(&self, document: &Html) -> Vec<Issue> {
        document
            .select(&BUTTON)
            .filter(|button| !has_accessible_name(*button))
            .map(|button| {
                Issue::new(
                    "WCAG2AA.Principle4.Guideline4_1.4_1_2.H91.Button.Name",
                    IssueType::Error,
                    "This button element does not have a name available to an accessibility API. Valid names are: title attribute, element content, aria-label attribute, aria-labelledby attribute.",
                )
                .with_context(button.html())
                .with_selector(css_path(button))
            })
            .collect()
    }
}

/// WCAG 4.1.1: `id` values are unique. Reports each duplicated value once,
/// at its second occurrence.
pub struct DuplicateId;

impl Rule for DuplicateId {
    fn name(&self) -> &'static str {
        "duplicate-id"
    }

    fn check(&self, document: &Html) -> Vec<Issue> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut issues = Vec::new();

        for element in document.select(&WITH_ID) {
            let Some(id) = element.value().id() else {
                continue;
            };
            let count = seen.entry(id).or_insert(0);
            *count += 1;
            if *count == 2 {
                issues.push(
                    Issue::new(
                        "WCAG2AA.Principle4.Guideline4_1.4_1_1.F77",
                        IssueType::Error,
                        format!("Duplicate id attribute value \"{id}\" found on the web page."),
                    )
                    .with_context(opening_tag(element))
                    .with_selector(format!("#{id}")),
                );
            }
        }

        issues
    }
}

fn needs_label(control: ElementRef<'_>) -> bool {
    if control.value().name() != "input" {
        return true;
    }
    let input_type = control
        .value()
        .attr("type")
        .unwrap_or("text")
        .to_ascii_lowercase();
    !UNLABELLED_INPUT_TYPES.contains(&input_type.as_str())
}

fn non_empty_attr<'a>(element: ElementRef<'a>, attr: &str) -> Option<&'a str> {
    element
        .value()
        .attr(attr)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn has_aria_name(element: ElementRef<'_>) -> bool {
    ["aria-label", "aria-labelledby", "title"]
        .iter()
        .any(|attr| non_empty_attr(element, attr).is_some())
}

/// Name from content: text, or an image with alt text, or ARIA/title.
fn has_accessible_name(element: ElementRef<'_>) -> bool {
    if has_aria_name(element) || !text_of(element).is_empty() {
        return true;
    }
    element
        .select(&IMG)
        .any(|img| non_empty_attr(img, "alt").is_some())
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn opening_tag(element: ElementRef<'_>) -> String {
    let attrs: String = element
        .value()
        .attrs()
        .map(|(k, v)| format!(" {k}=\"{v}\""))
        .collect();
    format!("<{}{}>", element.value().name(), attrs)
}

/// CSS path in pa11y's style: stops at the nearest ancestor with an id,
/// adds `:nth-child` where a sibling shares the tag name.
fn css_path(element: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    let mut current = Some(element);

    while let Some(el) = current {
        if let Some(id) = el.value().id() {
            parts.push(format!("#{id}"));
            break;
        }
        let name = el.value().name();
        let parent = el.parent().and_then(ElementRef::wrap);
        let same_tag = parent.map_or(1, |p| {
            p.children()
                .filter_map(ElementRef::wrap)
                .filter(|sibling| sibling.value().name() == name)
                .count()
        });
        if same_tag > 1 {
            let position = el
                .prev_siblings()
                .filter(|node| node.value().is_element())
                .count()
                + 1;
            parts.push(format!("{name}:nth-child({position})"));
        } else {
            parts.push(name.to_string());
        }
        current = parent;
    }

    parts.reverse();
    parts.join(" > ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(html: &str) -> Vec<String> {
        analyze(html, &default_rules())
            .into_iter()
            .map(|issue| issue.code)
            .collect()
    }

    fn check(rule: &dyn Rule, html: &str) -> Vec<Issue> {
        rule.check(&Html::parse_document(html))
    }

    const CLEAN: &str = r#"<!DOCTYPE html>
        <html lang="en">
        <head><title>Agency home</title></head>
        <body>
            <img src="seal.png" alt="Department seal">
            <img src="rule.png" alt="">
            <form>
                <label for="email">Email</label>
                <input id="email" type="email">
                <label>Name <input type="text"></label>
                <input type="search" aria-label="Search">
                <input type="hidden" name="csrf">
                <input type="submit" value="Go">
            </form>
            <a href="/about">About us</a>
            <a href="/"><img src="home.png" alt="Home"></a>
            <button>Save</button>
            <button aria-label="Close"><span class="icon"></span></button>
        </body>
        </html>"#;

    #[test]
    fn test_clean_document_has_no_issues() {
        let found = codes(CLEAN);
        assert!(found.is_empty(), "unexpected issues: {found:?}");
    }

    #[test]
    fn test_missing_lang() {
        let issues = check(&DocumentLanguage, "<html><head><title>t</title></head></html>");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, "WCAG2AA.Principle3.Guideline3_1.3_1_1.H57.2");
        assert_eq!(issues[0].selector, "html");
    }

    #[test]
    fn test_blank_lang_counts_as_missing() {
        let issues = check(&DocumentLanguage, r#"<html lang="  "><body></body></html>"#);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_missing_and_empty_title() {
        let missing = check(&DocumentTitle, "<html><head></head><body></body></html>");
        assert_eq!(missing.len(), 1);
        assert!(missing[0].code.ends_with("H25.1.NoTitleEl"));

        let empty = check(&DocumentTitle, "<html><head><title> </title></head></html>");
        assert_eq!(empty.len(), 1);
        assert!(empty[0].code.ends_with("H25.1.EmptyTitle"));
    }

    #[test]
    fn test_image_without_alt() {
        let issues = check(
            &ImageAlt,
            r#"<html><body><p>intro</p><img src="a.jpg" alt="A"><img src="photo.jpg"></body></html>"#,
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, "WCAG2AA.Principle1.Guideline1_1.1_1_1.H37");
        assert_eq!(issues[0].issue_type, IssueType::Error);
        assert!(issues[0].context.contains("photo.jpg"));
        assert_eq!(issues[0].selector, "html > body > img:nth-child(3)");
    }

    #[test]
    fn test_selector_stops_at_id() {
        let issues = check(
            &ImageAlt,
            r#"<html><body><div id="hero"><img src="a.png"></div></body></html>"#,
        );
        assert_eq!(issues[0].selector, "#hero > img");
    }

    #[test]
    fn test_unlabelled_controls() {
        let issues = check(
            &FormLabel,
            r#"<html><body><form>
                <input type="text" name="q">
                <select name="state"><option>VA</option></select>
                <textarea name="comments"></textarea>
                <label for="other">Other</label><input id="unrelated">
            </form></body></html>"#,
        );
        assert_eq!(issues.len(), 4);
        assert!(issues.iter().all(|i| i.code.ends_with("1_3_1.F68")));
    }

    #[test]
    fn test_empty_link() {
        let issues = check(
            &LinkContent,
            r#"<html><body><a href="/x"></a><a href="/y"><img src="i.png"></a><a name="anchor"></a></body></html>"#,
        );
        assert_eq!(issues.len(), 2);
        assert!(issues[0].code.ends_with("H91.A.NoContent"));
    }

    #[test]
    fn test_unnamed_button() {
        let issues = check(
            &ButtonName,
            r#"<html><body><button><i class="fa fa-close"></i></button><button title="Menu"></button></body></html>"#,
        );
        assert_eq!(issues.len(), 1);
        assert!(issues[0].code.ends_with("H91.Button.Name"));
    }

    #[test]
    fn test_duplicate_id_reported_once_per_value() {
        let issues = check(
            &DuplicateId,
            r#"<html><body><p id="a"></p><p id="a"></p><p id="a"></p><p id="b"></p></body></html>"#,
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].selector, "#a");
        assert!(issues[0].message.contains("\"a\""));
    }

    #[test]
    fn test_rules_have_distinct_names() {
        let rules = default_rules();
        let names: HashSet<_> = rules.iter().map(|r| r.name()).collect();
        assert_eq!(names.len(), rules.len());
    }
}
