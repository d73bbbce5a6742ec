//! Menu item tree.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Game {
    pub title: String,
    /// Opaque path reference handed to the emulator.
    pub path: String,
    /// Opaque emulator command.
    pub emulator: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Folder {
    pub title: String,
    pub children: Vec<Item>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Item {
    Game(Game),
    Folder(Folder),
}

impl Item {
    pub fn title(&self) -> &str {
        match self {
            Item::Game(g) => &g.title,
            Item::Folder(f) => &f.title,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Item::Folder(_))
    }
}

impl Folder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            children: Vec::new(),
        }
    }
}

/// Resolve the children of the folder at `path` (root for an empty path).
pub fn collection<'a>(root: &'a [Item], path: &[usize]) -> Option<&'a [Item]> {
    let mut items = root;
    for &idx in path {
        match items.get(idx)? {
            Item::Folder(f) => items = &f.children,
            Item::Game(_) => return None,
        }
    }
    Some(items)
}

pub fn collection_mut<'a>(root: &'a mut Vec<Item>, path: &[usize]) -> Option<&'a mut Vec<Item>> {
    let mut items = root;
    for &idx in path {
        match items.get_mut(idx)? {
            Item::Folder(f) => items = &mut f.children,
            Item::Game(_) => return None,
        }
    }
    Some(items)
}

/// Titles of the folders along `path`.
pub fn folder_titles(root: &[Item], path: &[usize]) -> Vec<String> {
    let mut titles = Vec::with_capacity(path.len());
    let mut items = root;
    for &idx in path {
        match items.get(idx) {
            Some(Item::Folder(f)) => {
                titles.push(f.title.clone());
                items = &f.children;
            }
            _ => break,
        }
    }
    titles
}

/// For each step of `path`, how many folders precede the entered folder in its
/// collection. This is the folder's position among its sibling folders, which is
/// how the saved folder tree addresses it.
pub fn folder_slots(root: &[Item], path: &[usize]) -> Option<Vec<usize>> {
    let mut slots = Vec::with_capacity(path.len());
    let mut items = root;
    for &idx in path {
        let Some(Item::Folder(f)) = items.get(idx) else {
            return None;
        };
        slots.push(items[..idx].iter().filter(|i| i.is_folder()).count());
        items = &f.children;
    }
    Some(slots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(n: &str) -> Item {
        Item::Game(Game {
            title: n.into(),
            path: format!("/roms/{}.nes", n),
            emulator: "fceux".into(),
        })
    }

    #[test]
    fn resolves_nested_collections() {
        let mut inner = Folder::new("Inner");
        inner.children.push(game("c"));
        let mut outer = Folder::new("Outer");
        outer.children.push(game("b"));
        outer.children.push(Item::Folder(inner));
        let root = vec![game("a"), Item::Folder(outer)];

        assert_eq!(collection(&root, &[]).map(|c| c.len()), Some(2));
        assert_eq!(collection(&root, &[1]).map(|c| c.len()), Some(2));
        assert_eq!(collection(&root, &[1, 1]).map(|c| c[0].title().to_string()), Some("c".into()));
        assert!(collection(&root, &[0]).is_none());
        assert!(collection(&root, &[7]).is_none());
        assert_eq!(folder_titles(&root, &[1, 1]), vec!["Outer".to_string(), "Inner".to_string()]);
    }

    #[test]
    fn folder_slots_count_sibling_folders_only() {
        let mut second = Folder::new("Dup");
        second.children = vec![game("x"), Item::Folder(Folder::new("Deep"))];
        let root = vec![
            Item::Folder(Folder::new("Dup")),
            game("a"),
            game("b"),
            Item::Folder(second),
        ];
        assert_eq!(folder_slots(&root, &[]), Some(vec![]));
        assert_eq!(folder_slots(&root, &[3]), Some(vec![1]));
        assert_eq!(folder_slots(&root, &[3, 1]), Some(vec![1, 0]));
        assert_eq!(folder_slots(&root, &[1]), None);
    }

    #[test]
    fn mutable_resolution_appends_in_place() {
        let mut root = vec![Item::Folder(Folder::new("Sports"))];
        if let Some(c) = collection_mut(&mut root, &[0]) {
            c.push(game("x"));
        }
        match &root[0] {
            Item::Folder(f) => assert_eq!(f.children.len(), 1),
            Item::Game(_) => panic!("expected folder"),
        }
    }
}
