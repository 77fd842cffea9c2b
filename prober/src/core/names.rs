//! Whitelist and blacklist of provider names.

use std::collections::HashSet;

/// Ordered whitelist/blacklist pair.
///
/// Lists keep insertion order and do not de-duplicate on insert. Adding any
/// name to the whitelist switches the lists into whitelist mode, after which
/// only whitelisted names are eligible (even once the whitelist drains).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameLists {
    whitelist: Vec<String>,
    blacklist: Vec<String>,
    whitelist_used: bool,
}

impl NameLists {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_whitelist<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist.extend(names.into_iter().map(Into::into));
        self.whitelist_used = true;
    }

    pub fn add_blacklist<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist.extend(names.into_iter().map(Into::into));
    }

    /// Remove the first occurrence of `name`. Returns whether it was present.
    pub fn remove_from_whitelist(&mut self, name: &str) -> bool {
        remove_first(&mut self.whitelist, name)
    }

    /// Remove the first occurrence of `name`. Returns whether it was present.
    pub fn remove_from_blacklist(&mut self, name: &str) -> bool {
        remove_first(&mut self.blacklist, name)
    }

    pub fn whitelist_len(&self) -> usize {
        self.whitelist.len()
    }

    pub fn blacklist_len(&self) -> usize {
        self.blacklist.len()
    }

    pub fn whitelist(&self) -> &[String] {
        &self.whitelist
    }

    pub fn blacklist(&self) -> &[String] {
        &self.blacklist
    }

    pub fn whitelist_used(&self) -> bool {
        self.whitelist_used
    }

    pub fn is_whitelisted(&self, name: &str) -> bool {
        self.whitelist.iter().any(|n| n == name)
    }

    pub fn is_blacklisted(&self, name: &str) -> bool {
        self.blacklist.iter().any(|n| n == name)
    }

    /// Blacklist with duplicates dropped, first occurrence kept.
    pub fn unique_blacklist(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.blacklist
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect()
    }
}

fn remove_first(list: &mut Vec<String>, name: &str) -> bool {
    match list.iter().position(|n| n == name) {
        Some(index) => {
            list.remove(index);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_preserves_order_and_enables_whitelist_mode() {
        let mut lists = NameLists::new();
        assert!(!lists.whitelist_used());
        lists.add_whitelist(["b", "a"]);
        lists.add_whitelist(vec!["c".to_string()]);
        assert_eq!(lists.whitelist(), ["b", "a", "c"]);
        assert!(lists.whitelist_used());
    }

    #[test]
    fn blacklist_does_not_enable_whitelist_mode() {
        let mut lists = NameLists::new();
        lists.add_blacklist(["x"]);
        assert!(!lists.whitelist_used());
        assert_eq!(lists.blacklist_len(), 1);
    }

    #[test]
    fn removing_absent_name_is_noop() {
        let mut lists = NameLists::new();
        lists.add_whitelist(["a"]);
        lists.add_blacklist(["b"]);
        assert!(!lists.remove_from_whitelist("zzz"));
        assert!(!lists.remove_from_blacklist("zzz"));
        assert_eq!(lists.whitelist_len(), 1);
        assert_eq!(lists.blacklist_len(), 1);
    }

    #[test]
    fn remove_drops_only_first_occurrence() {
        let mut lists = NameLists::new();
        lists.add_blacklist(["a", "b", "a"]);
        assert!(lists.remove_from_blacklist("a"));
        assert_eq!(lists.blacklist(), ["b", "a"]);
    }

    #[test]
    fn whitelist_mode_survives_draining() {
        let mut lists = NameLists::new();
        lists.add_whitelist(["a"]);
        lists.remove_from_whitelist("a");
        assert_eq!(lists.whitelist_len(), 0);
        assert!(lists.whitelist_used());
    }

    #[test]
    fn unique_blacklist_keeps_first_occurrence_order() {
        let mut lists = NameLists::new();
        lists.add_blacklist(["b", "a", "b", "c", "a"]);
        assert_eq!(lists.unique_blacklist(), vec!["b", "a", "c"]);
    }
}
