use crate::{Comparer, MultiValueMap};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

impl<K, V, KC, VC> Serialize for MultiValueMap<K, V, KC, VC>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self)
    }
}

impl<'de, K, V, KC, VC> Deserialize<'de> for MultiValueMap<K, V, KC, VC>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
    KC: Comparer<K> + Default,
    VC: Comparer<V> + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MapVisitor<K, V, KC, VC> {
            marker: PhantomData<MultiValueMap<K, V, KC, VC>>,
        }

        impl<'de, K, V, KC, VC> Visitor<'de> for MapVisitor<K, V, KC, VC>
        where
            K: Deserialize<'de>,
            V: Deserialize<'de>,
            KC: Comparer<K> + Default,
            VC: Comparer<V> + Default,
        {
            type Value = MultiValueMap<K, V, KC, VC>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a map")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut values = MultiValueMap::with_capacity_and_comparers(
                    map.size_hint().unwrap_or(0),
                    KC::default(),
                    VC::default(),
                );

                while let Some((key, value)) = map.next_entry()? {
                    values
                        .try_insert(key, value)
                        .map_err(<A::Error as de::Error>::custom)?;
                }

                Ok(values)
            }
        }

        let visitor = MapVisitor {
            marker: PhantomData,
        };

        deserializer.deserialize_map(visitor)
    }
}
