//! Historical trade routes from `common/history/trade`.

use crate::canonical::{Shape, canonicalize};
use crate::keyed::KeyedMap;
use crate::plan::scoped_key;
use std::fmt;
use vic3txt::{Tree, Value};

/// Export and import volume of one good with one partner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GoodFlow {
    pub exports: Option<i64>,
    pub imports: Option<i64>,
}

fn add_opt(own: Option<i64>, other: Option<i64>) -> Option<i64> {
    match (own, other) {
        (Some(a), Some(b)) => Some(a + b),
        (a, b) => a.or(b),
    }
}

impl GoodFlow {
    fn from_tree(tree: &Tree) -> Self {
        let canon = canonicalize(tree, &Shape::default());
        Self {
            exports: canon.opt_int("add_exports"),
            imports: canon.opt_int("add_imports"),
        }
    }

    /// Fields given in `later` replace ours.
    fn overlay(&mut self, later: GoodFlow) {
        self.exports = later.exports.or(self.exports);
        self.imports = later.imports.or(self.imports);
    }

    fn add(&mut self, other: GoodFlow) {
        self.exports = add_opt(self.exports, other.exports);
        self.imports = add_opt(self.imports, other.imports);
    }

    fn positive_exports(&self) -> Option<i64> {
        self.exports.filter(|&n| n > 0)
    }

    fn positive_imports(&self) -> Option<i64> {
        self.imports.filter(|&n| n > 0)
    }

    /// Whether rendering would print any field.
    fn is_visible(&self) -> bool {
        self.positive_exports().is_some() || self.positive_imports().is_some()
    }
}

/// Goods traded with one partner.
pub type PartnerGoods = KeyedMap<GoodFlow>;
/// Partners of one region.
pub type RegionTrade = KeyedMap<PartnerGoods>;

/// Everything under `TRADE`, keyed by scoped region.
#[derive(Debug, Clone, Default)]
pub struct TradeSet {
    regions: KeyedMap<RegionTrade>,
}

impl TradeSet {
    /// Reads every `TRADE` block. A region given more than once is combined.
    pub fn from_tree(tree: &Tree) -> Self {
        let mut regions: KeyedMap<RegionTrade> = KeyedMap::new();
        for block in tree.get_all("TRADE").filter_map(Value::as_block) {
            for (key, value) in block.pairs() {
                let partners = regions.entry_or_insert_with(key, KeyedMap::new);
                let Value::Block(region) = value else {
                    continue;
                };
                for (partner, goods) in region.pairs() {
                    let own = partners.entry_or_insert_with(partner, KeyedMap::new);
                    let Value::Block(goods) = goods else {
                        continue;
                    };
                    for (good, flow) in goods.pairs() {
                        let Value::Block(flow) = flow else {
                            continue;
                        };
                        own.entry_or_insert_with(good, GoodFlow::default)
                            .overlay(GoodFlow::from_tree(flow));
                    }
                }
            }
        }
        Self { regions }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn region(&self, name: &str) -> Option<&RegionTrade> {
        self.regions.get(&scoped_key(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.regions.contains_key(&scoped_key(name))
    }

    /// Folds the trade of `source` into `target`, by bare region name.
    ///
    /// The source key is removed, so repeating the call is a no-op.
    pub fn merge(&mut self, target: &str, source: &str) -> bool {
        if target == source {
            return false;
        }
        let Some(incoming) = self.regions.remove(&scoped_key(source)) else {
            return false;
        };
        let partners = self
            .regions
            .entry_or_insert_with(&scoped_key(target), KeyedMap::new);
        for (partner, goods) in incoming.iter() {
            let own = partners.entry_or_insert_with(partner, KeyedMap::new);
            for (good, flow) in goods.iter() {
                match own.get_mut(good) {
                    Some(existing) => existing.add(*flow),
                    None => {
                        own.insert(good, *flow);
                    }
                }
            }
        }
        true
    }
}

fn partner_visible(goods: &PartnerGoods) -> bool {
    goods.iter().any(|(_, flow)| flow.is_visible())
}

impl fmt::Display for TradeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TRADE = {{")?;
        for (region, partners) in self.regions.iter() {
            if !partners.iter().any(|(_, goods)| partner_visible(goods)) {
                continue;
            }
            writeln!(f, "    {}={{", region)?;
            for (partner, goods) in partners.iter() {
                if !partner_visible(goods) {
                    continue;
                }
                writeln!(f, "        {}={{", partner)?;
                for (good, flow) in goods.iter() {
                    if !flow.is_visible() {
                        continue;
                    }
                    writeln!(f, "            {} = {{", good)?;
                    if let Some(exports) = flow.positive_exports() {
                        writeln!(f, "                add_exports = {}", exports)?;
                    }
                    if let Some(imports) = flow.positive_imports() {
                        writeln!(f, "                add_imports = {}", imports)?;
                    }
                    writeln!(f, "            }}")?;
                }
                writeln!(f, "        }}")?;
            }
            writeln!(f, "    }}")?;
        }
        writeln!(f, "}}")
    }
}
