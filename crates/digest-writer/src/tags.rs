//! Display tags for posts: topic clusters, strict groups and study design.

use digest_common::StrictTopicGroup;
use digest_ranker::StudyType;

/// Topic label → short cluster tag.
const CLUSTER_TAGS: &[(&str, &str)] = &[
    ("personality psychology", "Personality"),
    ("personality science", "Personality"),
    ("intelligence cognitive abilities", "Intelligence"),
    ("intelligence research", "Intelligence"),
    ("relationship science", "Relationships"),
    ("sex differences", "Sex differences"),
    ("evolutionary psychology", "Evo psych"),
    ("social psychology", "Social psych"),
    ("behaviour genetics", "Behaviour genetics"),
    ("psychology of men and boys", "Men and boys"),
    ("weight management body composition", "Weight loss"),
    ("cardiometabolic outcomes", "Cardiometabolic"),
    ("dietary patterns foods", "Dietary patterns"),
    ("diet lifestyle longitudinal", "Cohort"),
];

pub fn cluster_tag(topic: &str) -> Option<&'static str> {
    let topic = topic.to_lowercase();
    CLUSTER_TAGS.iter().find(|(t, _)| *t == topic).map(|(_, tag)| *tag)
}

/// Cluster tag when one exists, otherwise the topic itself.
pub fn cluster_name(topic: &str) -> String {
    cluster_tag(topic).map(String::from).unwrap_or_else(|| topic.to_string())
}

pub fn study_type_tag(study_type: StudyType) -> Option<&'static str> {
    match study_type {
        StudyType::RandomizedControlledTrial => Some("RCT"),
        StudyType::MetaAnalysis              => Some("Meta-analysis"),
        StudyType::SystematicReview          => Some("Meta-analysis"),
        StudyType::MendelianRandomization    => Some("MR"),
        StudyType::Cohort                    => Some("Cohort"),
        StudyType::CrossSectional            => Some("Cross-sectional"),
        _ => None,
    }
}

/// "nutrition" → "Nutrition".
pub fn group_tag(group: &StrictTopicGroup) -> String {
    crate::sentences::capitalise_first(&group.name)
}

/// Strict groups any of the topics belongs to.
pub fn strict_groups_for<'a>(groups: &'a [StrictTopicGroup], topic_tags: &[String]) -> Vec<&'a StrictTopicGroup> {
    groups
        .iter()
        .filter(|g| topic_tags.iter().any(|t| g.contains_topic(t)))
        .collect()
}

pub fn tags_for(topic_tags: &[String], study_type: StudyType, groups: &[StrictTopicGroup]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    let mut push = |tag: String| {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    };

    for topic in topic_tags {
        if let Some(tag) = cluster_tag(topic) {
            push(tag.to_string());
        }
    }
    for group in strict_groups_for(groups, topic_tags) {
        push(group_tag(group));
    }
    if let Some(tag) = study_type_tag(study_type) {
        push(tag.to_string());
    }
    tags
}
