use crate::models::{ContainerKey, Post, SectionKind};

/// One line per section.
///
/// ```text
/// p: "abc" | "de" [strong]/1 | "f"
/// p*: "loose"                       (inferred tag)
/// ul
///   li: "one" [a href=http://x.com]/1
/// image /a.png
/// card embed {"url":"x"}
/// ```
///
/// A marker shows its markups outermost first and, after a slash, how many
/// of them close after it.
pub fn outline(post: &Post) -> String {
    let mut lines = Vec::new();
    for key in post.section_keys() {
        let Some(section) = post.section(key) else {
            continue;
        };
        match section.kind() {
            SectionKind::Markup(markup) => {
                let inferred = if markup.is_inferred() { "*" } else { "" };
                lines.push(format!(
                    "{}{inferred}: {}",
                    markup.tag_name(),
                    markers(post, ContainerKey::Section(key))
                ));
            }
            SectionKind::List(list) => {
                lines.push(list.tag_name().to_string());
                for item in post.list_items(key).unwrap_or_default() {
                    lines.push(format!("  li: {}", markers(post, ContainerKey::ListItem(item))));
                }
            }
            SectionKind::Image(image) => {
                lines.push(format!("image {}", image.src().unwrap_or("(none)")));
            }
            SectionKind::Card(card) => {
                lines.push(format!("card {} {}", card.name(), card.payload()));
            }
        }
    }
    lines.join("\n")
}

fn markers(post: &Post, container: ContainerKey) -> String {
    let keys = post.markers(container).unwrap_or_default();
    if keys.is_empty() {
        return "(empty)".to_string();
    }

    keys.into_iter()
        .filter_map(|key| {
            let marker = post.marker(key)?;
            let mut out = format!("{:?}", marker.value());
            if !marker.markups().is_empty() {
                let markups: Vec<String> = marker
                    .markups()
                    .iter()
                    .map(|m| {
                        let mut s = m.tag_name().to_string();
                        for (k, v) in m.attributes() {
                            s.push_str(&format!(" {k}={v}"));
                        }
                        s
                    })
                    .collect();
                out.push_str(&format!(" [{}]", markups.join(", ")));
            }
            let closed = post.closed_markup_count(key).unwrap_or(0);
            if closed > 0 {
                out.push_str(&format!("/{closed}"));
            }
            Some(out)
        })
        .collect::<Vec<_>>()
        .join(" | ")
}
