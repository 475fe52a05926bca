//! Default tree synthesized when no usable persisted filesystem exists.

use super::{
    node::VfsNode,
    path::{normalize_virtual_path, segments},
};

const WELCOME_TEXT: &str = "Welcome to the desktop.\n\nFiles you create here are kept in browser storage.\n";
const README_TEXT: &str = "Try the terminal: ls, cd, cat, mkdir, touch, rm, mv, cp.\n";
const DESKTOP_SETTINGS_JSON: &str = "{\n  \"theme\": \"default\",\n  \"wallpaper\": \"default\"\n}\n";

/// Builds the seed tree rooted at `/`, creating `home_directory` and its standard folders.
pub fn default_tree(home_directory: &str, now_ms: u64) -> VfsNode {
    let mut root = VfsNode::directory("", now_ms);
    let home = normalize_virtual_path(home_directory);

    let home_dir = ensure_directory_path(&mut root, &home, now_ms);
    if let Some(home_dir) = home_dir {
        for folder in ["Desktop", "Documents", "Downloads", "Pictures"] {
            insert_child(home_dir, VfsNode::directory(folder, now_ms));
        }
        if let Some(documents) = child_directory_mut(home_dir, "Documents") {
            insert_child(documents, VfsNode::file("welcome.txt", WELCOME_TEXT, now_ms));
        }
        insert_child(home_dir, VfsNode::file("readme.txt", README_TEXT, now_ms));
    }

    if let Some(config) = ensure_directory_path(&mut root, "/system/config", now_ms) {
        insert_child(
            config,
            VfsNode::file("desktop.json", DESKTOP_SETTINGS_JSON, now_ms),
        );
    }
    ensure_directory_path(&mut root, "/tmp", now_ms);
    root
}

fn ensure_directory_path<'a>(
    root: &'a mut VfsNode,
    normalized: &str,
    now_ms: u64,
) -> Option<&'a mut VfsNode> {
    let mut current = root;
    for segment in segments(normalized) {
        let dir = current.as_directory_mut()?;
        current = dir
            .children
            .entry(segment.to_string())
            .or_insert_with(|| VfsNode::directory(segment, now_ms));
    }
    Some(current)
}

fn child_directory_mut<'a>(parent: &'a mut VfsNode, name: &str) -> Option<&'a mut VfsNode> {
    parent
        .as_directory_mut()?
        .children
        .get_mut(name)
        .filter(|child| child.as_directory().is_some())
}

fn insert_child(parent: &mut VfsNode, child: VfsNode) {
    if let Some(dir) = parent.as_directory_mut() {
        dir.children.entry(child.name().to_string()).or_insert(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_tree_contains_home_and_system_folders() {
        let root = default_tree("/home/user", 7);
        let top = &root.as_directory().expect("root dir").children;
        assert!(top.contains_key("home"));
        assert!(top.contains_key("system"));
        assert!(top.contains_key("tmp"));

        let user = &top["home"].as_directory().expect("home").children["user"];
        let user_children = &user.as_directory().expect("user").children;
        assert!(user_children.contains_key("Documents"));
        assert!(user_children.contains_key("readme.txt"));
        assert!(root.is_well_formed());
    }

    #[test]
    fn seed_tree_honors_custom_home() {
        let root = default_tree("guest/../visitor", 1);
        let top = &root.as_directory().expect("root dir").children;
        assert!(top.contains_key("visitor"));
    }
}
