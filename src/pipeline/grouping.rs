use std::collections::HashMap;

use crate::models::signal::StoredSignal;

/// Signals of one symbol, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolGroup {
    pub symbol: String,
    pub signals: Vec<StoredSignal>,
}

/// Partition `signals` by symbol.
///
/// Groups are returned in order of first appearance and each group keeps
/// the relative order of its signals.
pub fn group_by_symbol(signals: Vec<StoredSignal>) -> Vec<SymbolGroup> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<SymbolGroup> = Vec::new();

    for signal in signals {
        match positions.get(&signal.symbol) {
            Some(&index) => groups[index].signals.push(signal),
            None => {
                positions.insert(signal.symbol.clone(), groups.len());
                groups.push(SymbolGroup {
                    symbol: signal.symbol.clone(),
                    signals: vec![signal],
                });
            }
        }
    }
    groups
}
