//! State for one element of a list or one entry of a record.
//!
//! The element setter rebuilds the container from the value it was created
//! with and writes the whole container upstream. Derive fresh item states on
//! every pass; an old one writes back a stale container.

use std::collections::BTreeMap;
use std::rc::Rc;

use draftcell_core::State;

pub fn item_state<T: Clone + 'static>(list: &State<Vec<T>>, index: usize) -> State<T> {
    let value = list.value.as_ref().and_then(|items| items.get(index).cloned());
    let setter = match (&list.value, &list.setter) {
        (Some(items), Some(set)) => {
            let items = items.clone();
            let set = set.clone();
            Some(Rc::new(move |v: T| {
                if index >= items.len() {
                    log::warn!("item_state: index {index} out of range (len {})", items.len());
                    return;
                }
                let mut next = items.clone();
                next[index] = v;
                set(next);
            }) as Rc<dyn Fn(T)>)
        }
        _ => None,
    };
    State { value, setter }
}

/// One state per element.
pub fn item_states<T: Clone + 'static>(list: &State<Vec<T>>) -> Vec<State<T>> {
    let len = list.value.as_ref().map_or(0, Vec::len);
    (0..len).map(|i| item_state(list, i)).collect()
}

/// Writing inserts the key if the record does not have it yet.
pub fn field_state<K, V>(record: &State<BTreeMap<K, V>>, key: K) -> State<V>
where
    K: Ord + Clone + 'static,
    V: Clone + 'static,
{
    let value = record.value.as_ref().and_then(|map| map.get(&key).cloned());
    let setter = match (&record.value, &record.setter) {
        (Some(map), Some(set)) => {
            let map = map.clone();
            let set = set.clone();
            Some(Rc::new(move |v: V| {
                let mut next = map.clone();
                next.insert(key.clone(), v);
                set(next);
            }) as Rc<dyn Fn(V)>)
        }
        _ => None,
    };
    State { value, setter }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftcell_core::signal;

    #[test]
    fn item_setter_replaces_only_its_element() {
        let list = signal(Some(vec!["a", "b", "c"]));
        let second = item_state(&State::from_signal(&list), 1);
        assert_eq!(second.value, Some("b"));

        second.set("B");
        assert_eq!(list.get(), Some(vec!["a", "B", "c"]));
    }

    #[test]
    fn out_of_range_item_is_empty_and_inert() {
        let list = signal(Some(vec![1, 2]));
        let missing = item_state(&State::from_signal(&list), 5);
        assert_eq!(missing.value, None);
        missing.set(9);
        assert_eq!(list.get(), Some(vec![1, 2]));
    }

    #[test]
    fn loading_list_yields_read_only_items() {
        let list = signal(None::<Vec<i32>>);
        let item = item_state(&State::from_signal(&list), 0);
        assert!(item.is_read_only());
        assert!(item_states(&State::from_signal(&list)).is_empty());
    }

    #[test]
    fn item_states_cover_every_element() {
        let list = signal(Some(vec![10, 20, 30]));
        let states = item_states(&State::from_signal(&list));
        let values: Vec<_> = states.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![Some(10), Some(20), Some(30)]);
    }

    #[test]
    fn field_setter_inserts_missing_keys() {
        let record = signal(Some(BTreeMap::from([("host", "localhost".to_string())])));
        let port = field_state(&State::from_signal(&record), "port");
        assert_eq!(port.value, None);
        assert!(!port.is_read_only());

        port.set("8080".to_string());
        let map = record.get().unwrap();
        assert_eq!(map.get("port").map(String::as_str), Some("8080"));
        assert_eq!(map.get("host").map(String::as_str), Some("localhost"));
    }
}
