use std::collections::HashSet;

use crate::dom::{Dom, NodeId, has_class};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
    StartsWith { key: String, value: String },
    EndsWith { key: String, value: String },
    Contains { key: String, value: String },
    Includes { key: String, value: String },
    DashMatch { key: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SelectorStep {
    pub(crate) tag: Option<String>,
    pub(crate) universal: bool,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<AttrCondition>,
}

impl SelectorStep {
    fn id_only(&self) -> Option<&str> {
        if !self.universal && self.tag.is_none() && self.classes.is_empty() && self.attrs.is_empty()
        {
            self.id.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPart {
    pub(crate) step: SelectorStep,
    // Relation to previous (left) selector part.
    pub(crate) combinator: Option<Combinator>,
}

pub(crate) fn query_selector(dom: &Dom, selector: &str) -> Result<Option<NodeId>> {
    let all = query_selector_all(dom, selector)?;
    Ok(all.into_iter().next())
}

pub(crate) fn query_selector_all(dom: &Dom, selector: &str) -> Result<Vec<NodeId>> {
    let groups = parse_selector_groups(selector)?;

    if groups.len() == 1 && groups[0].len() == 1 {
        if let Some(id) = groups[0][0].step.id_only() {
            return Ok(dom.by_id(id).into_iter().collect());
        }
    }

    let mut ids = Vec::new();
    dom.collect_elements_dfs(dom.root, &mut ids);

    let mut seen = HashSet::new();
    let mut matched = Vec::new();
    for candidate in ids {
        if groups
            .iter()
            .any(|steps| matches_selector_chain(dom, candidate, steps))
            && seen.insert(candidate)
        {
            matched.push(candidate);
        }
    }
    Ok(matched)
}

fn matches_selector_chain(dom: &Dom, node_id: NodeId, steps: &[SelectorPart]) -> bool {
    if steps.is_empty() {
        return false;
    }
    if !matches_step(dom, node_id, &steps[steps.len() - 1].step) {
        return false;
    }

    let mut current = node_id;
    for idx in (1..steps.len()).rev() {
        let prev_step = &steps[idx - 1].step;
        let combinator = steps[idx].combinator.unwrap_or(Combinator::Descendant);

        let matched = match combinator {
            Combinator::Child => {
                let Some(parent) = dom.parent(current) else {
                    return false;
                };
                if matches_step(dom, parent, prev_step) {
                    Some(parent)
                } else {
                    None
                }
            }
            Combinator::Descendant => {
                let mut cursor = dom.parent(current);
                let mut found = None;
                while let Some(parent) = cursor {
                    if matches_step(dom, parent, prev_step) {
                        found = Some(parent);
                        break;
                    }
                    cursor = dom.parent(parent);
                }
                found
            }
        };

        let Some(matched) = matched else {
            return false;
        };
        current = matched;
    }

    true
}

fn matches_step(dom: &Dom, node_id: NodeId, step: &SelectorStep) -> bool {
    let Some(element) = dom.element(node_id) else {
        return false;
    };

    if !step.universal {
        if let Some(tag) = &step.tag {
            if !element.tag_name.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
    }

    if let Some(id) = &step.id {
        if element.attrs.get("id") != Some(id) {
            return false;
        }
    }

    if step
        .classes
        .iter()
        .any(|class_name| !has_class(element, class_name))
    {
        return false;
    }

    for cond in &step.attrs {
        let matched = match cond {
            AttrCondition::Exists { key } => element.attrs.contains_key(key),
            AttrCondition::Eq { key, value } => element.attrs.get(key) == Some(value),
            AttrCondition::StartsWith { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|actual| !value.is_empty() && actual.starts_with(value)),
            AttrCondition::EndsWith { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|actual| !value.is_empty() && actual.ends_with(value)),
            AttrCondition::Contains { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|actual| !value.is_empty() && actual.contains(value)),
            AttrCondition::Includes { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|actual| actual.split_whitespace().any(|token| token == value)),
            AttrCondition::DashMatch { key, value } => {
                element.attrs.get(key).is_some_and(|actual| {
                    actual == value || actual.starts_with(&format!("{value}-"))
                })
            }
        };
        if !matched {
            return false;
        }
    }

    true
}

pub(crate) fn parse_selector_groups(selector: &str) -> Result<Vec<Vec<SelectorPart>>> {
    let groups = split_selector_groups(selector)?;
    let mut parsed = Vec::with_capacity(groups.len());
    for group in groups {
        parsed.push(parse_selector_chain(&group)?);
    }
    Ok(parsed)
}

fn split_selector_groups(selector: &str) -> Result<Vec<String>> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;

    for ch in selector.chars() {
        match ch {
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                if bracket_depth == 0 {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                bracket_depth -= 1;
                current.push(ch);
            }
            ',' if bracket_depth == 0 => {
                let trimmed = current.trim();
                if trimmed.is_empty() {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                groups.push(trimmed.to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if bracket_depth != 0 {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    let trimmed = current.trim();
    if trimmed.is_empty() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }
    groups.push(trimmed.to_string());
    Ok(groups)
}

fn parse_selector_chain(selector: &str) -> Result<Vec<SelectorPart>> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    let tokens = tokenize_selector(selector)?;
    let mut steps = Vec::new();
    let mut pending_combinator: Option<Combinator> = None;

    for token in tokens {
        if token == ">" {
            if pending_combinator.is_some() || steps.is_empty() {
                return Err(Error::UnsupportedSelector(selector.into()));
            }
            pending_combinator = Some(Combinator::Child);
            continue;
        }

        let step = parse_selector_step(&token)?;
        let combinator = if steps.is_empty() {
            None
        } else {
            Some(pending_combinator.take().unwrap_or(Combinator::Descendant))
        };
        steps.push(SelectorPart { step, combinator });
    }

    if steps.is_empty() || pending_combinator.is_some() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    Ok(steps)
}

fn tokenize_selector(selector: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;

    for ch in selector.chars() {
        match ch {
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                if bracket_depth == 0 {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                bracket_depth -= 1;
                current.push(ch);
            }
            '>' if bracket_depth == 0 => {
                if !current.trim().is_empty() {
                    tokens.push(current.trim().to_string());
                }
                current.clear();
                tokens.push(">".to_string());
            }
            ch if ch.is_ascii_whitespace() && bracket_depth == 0 => {
                if !current.trim().is_empty() {
                    tokens.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if bracket_depth != 0 {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    if !current.trim().is_empty() {
        tokens.push(current.trim().to_string());
    }

    Ok(tokens)
}

fn parse_selector_step(part: &str) -> Result<SelectorStep> {
    let part = part.trim();
    if part.is_empty() {
        return Err(Error::UnsupportedSelector(part.into()));
    }

    let bytes = part.as_bytes();
    let mut i = 0usize;
    let mut step = SelectorStep::default();

    while i < bytes.len() {
        match bytes[i] {
            b'*' => {
                if step.universal || step.tag.is_some() {
                    return Err(Error::UnsupportedSelector(part.into()));
                }
                step.universal = true;
                i += 1;
            }
            b'#' => {
                i += 1;
                let Some((id, next)) = parse_ident(part, i) else {
                    return Err(Error::UnsupportedSelector(part.into()));
                };
                if step.id.replace(id).is_some() {
                    return Err(Error::UnsupportedSelector(part.into()));
                }
                i = next;
            }
            b'.' => {
                i += 1;
                let Some((class_name, next)) = parse_ident(part, i) else {
                    return Err(Error::UnsupportedSelector(part.into()));
                };
                step.classes.push(class_name);
                i = next;
            }
            b'[' => {
                let (attr, next) = parse_attr_condition(part, i)?;
                step.attrs.push(attr);
                i = next;
            }
            // Pseudo-classes are out of scope for page fixtures.
            b':' => return Err(Error::UnsupportedSelector(part.into())),
            _ => {
                if step.tag.is_some()
                    || step.id.is_some()
                    || !step.classes.is_empty()
                    || !step.attrs.is_empty()
                    || step.universal
                {
                    return Err(Error::UnsupportedSelector(part.into()));
                }
                let Some((tag, next)) = parse_ident(part, i) else {
                    return Err(Error::UnsupportedSelector(part.into()));
                };
                step.tag = Some(tag.to_ascii_lowercase());
                i = next;
            }
        }
    }

    if step.tag.is_none()
        && step.id.is_none()
        && step.classes.is_empty()
        && step.attrs.is_empty()
        && !step.universal
    {
        return Err(Error::UnsupportedSelector(part.into()));
    }
    Ok(step)
}

fn parse_ident(part: &str, start: usize) -> Option<(String, usize)> {
    let bytes = part.as_bytes();
    let mut i = start;
    while i < bytes.len() && is_ident_byte(bytes[i]) {
        i += 1;
    }
    if i == start {
        return None;
    }
    Some((part[start..i].to_string(), i))
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn parse_attr_condition(part: &str, start: usize) -> Result<(AttrCondition, usize)> {
    let bytes = part.as_bytes();
    debug_assert_eq!(bytes.get(start), Some(&b'['));
    let mut i = start + 1;

    let key_start = i;
    while i < bytes.len() && is_ident_byte(bytes[i]) {
        i += 1;
    }
    let key = part[key_start..i].to_string();
    if key.is_empty() {
        return Err(Error::UnsupportedSelector(part.into()));
    }

    if bytes.get(i) == Some(&b']') {
        return Ok((AttrCondition::Exists { key }, i + 1));
    }

    let op = match bytes.get(i) {
        Some(b'=') => {
            i += 1;
            b'='
        }
        Some(&op @ (b'^' | b'$' | b'*' | b'~' | b'|')) if bytes.get(i + 1) == Some(&b'=') => {
            i += 2;
            op
        }
        _ => return Err(Error::UnsupportedSelector(part.into())),
    };

    let value = match bytes.get(i) {
        Some(&quote @ (b'"' | b'\'')) => {
            i += 1;
            let value_start = i;
            while i < bytes.len() && bytes[i] != quote {
                i += 1;
            }
            if i >= bytes.len() {
                return Err(Error::UnsupportedSelector(part.into()));
            }
            let value = part[value_start..i].to_string();
            i += 1;
            value
        }
        _ => {
            let value_start = i;
            while i < bytes.len() && bytes[i] != b']' {
                i += 1;
            }
            part[value_start..i].trim().to_string()
        }
    };

    if bytes.get(i) != Some(&b']') {
        return Err(Error::UnsupportedSelector(part.into()));
    }
    i += 1;

    let condition = match op {
        b'=' => AttrCondition::Eq { key, value },
        b'^' => AttrCondition::StartsWith { key, value },
        b'$' => AttrCondition::EndsWith { key, value },
        b'*' => AttrCondition::Contains { key, value },
        b'~' => AttrCondition::Includes { key, value },
        b'|' => AttrCondition::DashMatch { key, value },
        _ => unreachable!(),
    };
    Ok((condition, i))
}
