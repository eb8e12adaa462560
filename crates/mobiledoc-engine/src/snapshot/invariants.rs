use std::collections::HashSet;

use crate::models::{ContainerKey, MarkerKey, Post, SectionKind};

/// Panic if the post breaks a structural invariant.
pub fn check(post: &Post) {
    let sections = post.section_keys();
    assert_eq!(
        sections.len(),
        post.sections().len(),
        "section list length disagrees with traversal"
    );
    assert_eq!(sections.first().copied(), post.sections().head(), "wrong section head");
    assert_eq!(sections.last().copied(), post.sections().tail(), "wrong section tail");

    let mut seen_sections = HashSet::new();
    let mut seen_markers = HashSet::new();
    for (i, &key) in sections.iter().enumerate() {
        assert!(seen_sections.insert(key), "section {key:?} linked twice");
        let Some(section) = post.section(key) else {
            panic!("section {i} is linked but missing from the arena");
        };
        let expected_prev = i.checked_sub(1).map(|p| sections[p]);
        assert_eq!(section.links().prev(), expected_prev, "section {i} has a stale prev link");

        match section.kind() {
            SectionKind::Markup(_) => {
                check_markers(post, ContainerKey::Section(key), &mut seen_markers);
            }
            SectionKind::List(list) => {
                let items = post.list_items(key).unwrap_or_default();
                assert_eq!(items.len(), list.items().len(), "item list length disagrees");
                for item in items {
                    let parent = post.list_item(item).and_then(|li| li.parent());
                    assert_eq!(parent, Some(key), "item {item:?} has a wrong parent");
                    check_markers(post, ContainerKey::ListItem(item), &mut seen_markers);
                }
            }
            SectionKind::Image(_) | SectionKind::Card(_) => {}
        }
    }
}

fn check_markers(post: &Post, container: ContainerKey, seen: &mut HashSet<MarkerKey>) {
    let markers = post.markers(container).unwrap_or_default();
    let length = post.marker_list(container).map(|list| list.len()).unwrap_or(0);
    assert_eq!(markers.len(), length, "marker list length of {container:?} disagrees with traversal");
    // Markups still open from the previous marker.
    let mut open = 0;
    for (i, &key) in markers.iter().enumerate() {
        assert!(seen.insert(key), "marker {key:?} is in more than one container");
        let Some(marker) = post.marker(key) else {
            panic!("marker {i} is linked but missing from the arena");
        };
        assert_eq!(marker.parent(), Some(container), "marker {i} has a wrong parent");
        let expected_prev = i.checked_sub(1).map(|p| markers[p]);
        assert_eq!(marker.links().prev(), expected_prev, "marker {i} has a stale prev link");

        let opened = post.opened_markups(key).map(<[_]>::len).unwrap_or(0);
        let closed = post.closed_markup_count(key).unwrap_or(0);
        assert_eq!(
            open + opened,
            marker.markups().len(),
            "marker {i} does not extend the open stack"
        );
        assert!(closed <= marker.markups().len(), "marker {i} closes more than it has open");
        open = marker.markups().len() - closed;
    }
    assert_eq!(open, 0, "markups left open at the end of {container:?}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Builder;
    use crate::parsing::parse_html;

    #[test]
    fn imported_posts_pass() {
        let mut builder = Builder::new();
        let post = parse_html(
            "<h1>T</h1><p>a<b>b<i>c</i></b>d</p><ul><li><a href=\"x\">l</a></li></ul>",
            &mut builder,
        )
        .unwrap();
        check(&post);
    }

    #[test]
    #[should_panic(expected = "more than one container")]
    fn shared_markers_are_caught() {
        let builder = Builder::new();
        let mut post = builder.create_post();
        let section = builder.create_markup_section(&mut post, Some("p")).unwrap();
        post.append_section(section).unwrap();
        let marker = builder.create_marker(&mut post, "x", vec![]);
        post.append_marker(ContainerKey::Section(section), marker).unwrap();
        let mut seen = HashSet::from([marker]);
        check_markers(&post, ContainerKey::Section(section), &mut seen);
    }
}
