//! Tree view of a loaded table: Pillar → Clusters → Spokes, in table order.

use serde::Serialize;

use crate::topic_map::record::{Level, TopicRecord};
use crate::topic_map::table::TopicTable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyNode {
    pub title: String,
    pub level: Level,
    pub priority_score: u8,
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    fn leaf(record: &TopicRecord) -> Self {
        Self {
            title: record.content_title.clone(),
            level: record.level,
            priority_score: record.priority_score,
            children: Vec::new(),
        }
    }
}

/// Builds the tree rooted at the table's Pillar. `None` only for an empty table.
pub fn build_hierarchy(table: &TopicTable) -> Option<HierarchyNode> {
    let pillar = table.pillar()?;

    let mut root = HierarchyNode::leaf(pillar);
    for cluster in children_of(table, &pillar.content_title, Level::Cluster) {
        let mut node = HierarchyNode::leaf(cluster);
        node.children = children_of(table, &cluster.content_title, Level::Spoke)
            .into_iter()
            .map(HierarchyNode::leaf)
            .collect();
        root.children.push(node);
    }
    Some(root)
}

/// Parent references resolve on trimmed titles, the same rule validation applies.
fn children_of<'a>(table: &'a TopicTable, parent: &str, level: Level) -> Vec<&'a TopicRecord> {
    let parent = parent.trim();
    table
        .records()
        .iter()
        .filter(|r| r.level == level && r.parent_topic.as_deref().map(str::trim) == Some(parent))
        .collect()
}

/// Plain-text rendering with box-drawing connectors.
pub fn render_hierarchy(root: &HierarchyNode) -> String {
    let mut out = format!("{} (Priority: {})\n", root.title, root.priority_score);
    render_children(&root.children, "", &mut out);
    out
}

fn render_children(children: &[HierarchyNode], indent: &str, out: &mut String) {
    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        let connector = if last { "└── " } else { "├── " };
        out.push_str(&format!(
            "{indent}{connector}{} (Priority: {})\n",
            child.title, child.priority_score
        ));
        let next_indent = format!("{indent}{}", if last { "    " } else { "│   " });
        render_children(&child.children, &next_indent, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic_map::validation::fixtures::{content_marketing, record};

    #[test]
    fn test_hierarchy_nests_by_parent() {
        let table = TopicTable::load(content_marketing()).unwrap();
        let root = build_hierarchy(&table).unwrap();
        assert_eq!(root.title, "Content Marketing");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].title, "Blog SEO Basics");
        assert_eq!(root.children[0].children[0].title, "Meta Description Tips");
    }

    #[test]
    fn test_padded_parent_references_still_nest() {
        let mut records = content_marketing();
        records[1].parent_topic = Some("Content Marketing ".to_string());
        records[2].parent_topic = Some("  Blog SEO Basics".to_string());
        let table = TopicTable::load(records).unwrap();

        let root = build_hierarchy(&table).unwrap();
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].title, "Blog SEO Basics");
        assert_eq!(root.children[0].children.len(), 1);
        assert_eq!(root.children[0].children[0].title, "Meta Description Tips");
    }

    #[test]
    fn test_render_uses_connectors() {
        let mut records = content_marketing();
        records.push(record(
            Level::Cluster,
            "Content Distribution",
            Some("Content Marketing"),
            2,
        ));
        let table = TopicTable::load(records).unwrap();
        let text = render_hierarchy(&build_hierarchy(&table).unwrap());
        assert_eq!(
            text,
            "Content Marketing (Priority: 5)\n\
             ├── Blog SEO Basics (Priority: 4)\n\
             │   └── Meta Description Tips (Priority: 3)\n\
             └── Content Distribution (Priority: 2)\n"
        );
    }
}
