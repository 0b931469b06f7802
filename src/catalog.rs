use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The full category → item → count tree.
///
/// This is the single source of truth for remaining stock. It is persisted as
/// one JSON document and read back in full on every request:
///
/// ```text
/// {
///   "categories": [
///     { "name": "Electronics", "items": [ { "name": "Cable", "count": 3 } ] }
///   ]
/// }
/// ```
///
/// # Examples
///
/// ```
/// use stockbook::{Catalog, Category, Item};
///
/// let catalog = Catalog::new(vec![Category::new(
///     "Electronics",
///     vec![Item::new("Cable", 3)],
/// )]);
/// assert_eq!(catalog.count_of("Electronics", "Cable"), Some(3));
/// assert_eq!(catalog.count_of("Electronics", "Adapter"), None);
/// assert!(Catalog::default().categories.is_empty());
/// ```
///
/// Keys the service does not know about, at any level, are kept in `extra`
/// and written back unchanged on save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub categories: Vec<Category>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A named group of items. Names are unique within a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A bookable item and its remaining stock.
///
/// `count` is unsigned: a document holding a negative count fails to parse
/// rather than loading as a value a booking could decrement further.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub count: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Catalog {
    pub fn new(categories: Vec<Category>) -> Self {
        Catalog {
            categories,
            extra: Map::new(),
        }
    }

    /// Look up a category by exact name.
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn category_mut(&mut self, name: &str) -> Option<&mut Category> {
        self.categories.iter_mut().find(|c| c.name == name)
    }

    /// Remaining stock for `category`/`item`, or `None` if either is unknown.
    pub fn count_of(&self, category: &str, item: &str) -> Option<u32> {
        self.category(category)?.item(item).map(|i| i.count)
    }
}

impl Category {
    pub fn new(name: impl Into<String>, items: Vec<Item>) -> Self {
        Category {
            name: name.into(),
            items,
            extra: Map::new(),
        }
    }

    /// Look up an item by exact name within this category.
    pub fn item(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.name == name)
    }

    pub fn item_mut(&mut self, name: &str) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.name == name)
    }
}

impl Item {
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Item {
            name: name.into(),
            count,
            extra: Map::new(),
        }
    }

    /// Take one unit of stock, returning the count before the decrement.
    ///
    /// Returns `None` and leaves the item untouched when it is out of stock.
    ///
    /// ```
    /// use stockbook::Item;
    ///
    /// let mut cable = Item::new("Cable", 1);
    /// assert_eq!(cable.take_one(), Some(1));
    /// assert_eq!(cable.count, 0);
    /// assert_eq!(cable.take_one(), None);
    /// assert_eq!(cable.count, 0);
    /// ```
    pub fn take_one(&mut self) -> Option<u32> {
        let previous = self.count;
        self.count = previous.checked_sub(1)?;
        Some(previous)
    }
}
