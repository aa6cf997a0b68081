//! `items.txt`.

use std::sync::OnceLock;

use crate::error::Result;
use crate::parser::FileLineData;
use crate::registry::{DataKind, DataSet, GameData};
use crate::schema::{
    require, Element, FieldValue, PbsModel, Record, Schema, SchemaBuilder, SchemaEntry, Value,
};
use crate::types::enums::{BATTLE_USES, FIELD_USES};
use crate::types::{BattleUse, FieldUse, Item, Name};

use super::pipeline::RecordCompiler;

#[derive(Debug, Clone, PartialEq)]
pub struct ItemInfo {
    pub id: Name,
    pub name: String,
    pub name_plural: String,
    pub portion_name: Option<String>,
    pub portion_name_plural: Option<String>,
    pub pocket: u32,
    pub price: u32,
    /// Defaults to half the price.
    pub sell_price: Option<u32>,
    pub bp_price: u32,
    pub field_use: FieldUse,
    pub battle_use: BattleUse,
    pub flags: Vec<String>,
    pub consumable: Option<bool>,
    pub show_quantity: Option<bool>,
    pub move_id: Option<Name>,
    pub description: String,
}

impl PbsModel for ItemInfo {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            SchemaBuilder::new("items")
                .field("Name", SchemaEntry::single(Element::string()))
                .field("NamePlural", SchemaEntry::single(Element::string()))
                .field("PortionName", SchemaEntry::single(Element::string()))
                .field("PortionNamePlural", SchemaEntry::single(Element::string()))
                .field("Pocket", SchemaEntry::single(Element::positive()))
                .field("Price", SchemaEntry::single(Element::uint()))
                .field("SellPrice", SchemaEntry::single(Element::uint()))
                .field("BPPrice", SchemaEntry::single(Element::uint()))
                .field("FieldUse", SchemaEntry::single(Element::enumeration(&FIELD_USES)))
                .field("BattleUse", SchemaEntry::single(Element::enumeration(&BATTLE_USES)))
                .field("Flags", SchemaEntry::array(vec![Element::string()]))
                .field("Consumable", SchemaEntry::single(Element::boolean()))
                .field("ShowQuantity", SchemaEntry::single(Element::boolean()))
                .field(
                    "Move",
                    SchemaEntry::single(Element::reference(DataKind::Move).allow_none()),
                )
                .field("Description", SchemaEntry::single(Element::text()))
                .build()
        })
    }

    fn from_record(record: &Record, line: &FileLineData) -> Result<Self> {
        Ok(Self {
            id: require(record.section_name(0), "section", line)?,
            name: record.string("Name").unwrap_or_else(|| "Unnamed".to_string()),
            name_plural: record.string("NamePlural").unwrap_or_else(|| "Unnamed".to_string()),
            portion_name: record.string("PortionName"),
            portion_name_plural: record.string("PortionNamePlural"),
            pocket: record.uint("Pocket").unwrap_or(1),
            price: record.uint("Price").unwrap_or(0),
            sell_price: record.uint("SellPrice"),
            bp_price: record.uint("BPPrice").unwrap_or(1),
            field_use: record
                .name("FieldUse")
                .and_then(|n| FieldUse::from_name(n.as_str()))
                .unwrap_or(FieldUse::NoFieldUse),
            battle_use: record
                .name("BattleUse")
                .and_then(|n| BattleUse::from_name(n.as_str()))
                .unwrap_or(BattleUse::NoBattleUse),
            flags: record.strings("Flags"),
            consumable: record.bool("Consumable"),
            show_quantity: record.bool("ShowQuantity"),
            move_id: record.name("Move"),
            description: record.string("Description").unwrap_or_else(|| "???".to_string()),
        })
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new(vec![Some(Value::Name(self.id))]);
        record.set_value("Name", Some(self.name.as_str()));
        record.set_value("NamePlural", Some(self.name_plural.as_str()));
        record.set_value("PortionName", self.portion_name.as_deref());
        record.set_value("PortionNamePlural", self.portion_name_plural.as_deref());
        record.set_value("Pocket", Some(self.pocket));
        record.set_value("Price", Some(self.price));
        record.set_value("SellPrice", self.sell_price);
        record.set_value("BPPrice", Some(self.bp_price));
        record.set_value("FieldUse", Some(self.field_use.as_str()));
        record.set_value("BattleUse", Some(self.battle_use.as_str()));
        record.set_strings("Flags", &self.flags);
        record.set_value("Consumable", self.consumable);
        record.set_value("ShowQuantity", self.show_quantity);
        record.set_value("Move", self.move_id);
        record.set_value("Description", Some(self.description.as_str()));
        record
    }
}

#[derive(Debug, Default)]
pub struct ItemCompiler;

impl RecordCompiler for ItemCompiler {
    type Entity = Item;
    type Model = ItemInfo;
    const ORDER: i32 = 6;

    fn data_set(data: &GameData) -> &DataSet<Item> {
        &data.items
    }

    fn data_set_mut(data: &mut GameData) -> &mut DataSet<Item> {
        &mut data.items
    }

    fn convert_to_entity(&self, m: ItemInfo, _: &GameData, _: &FileLineData) -> Result<Item> {
        Ok(Item {
            id: m.id,
            name: m.name,
            name_plural: m.name_plural,
            portion_name: m.portion_name,
            portion_name_plural: m.portion_name_plural,
            pocket: m.pocket,
            price: m.price,
            sell_price: m.sell_price.unwrap_or(m.price / 2),
            bp_price: m.bp_price,
            field_use: m.field_use,
            battle_use: m.battle_use,
            flags: m.flags,
            consumable: m.consumable.unwrap_or(true),
            show_quantity: m.show_quantity.unwrap_or(true),
            move_id: m.move_id,
            description: m.description,
        })
    }

    fn convert_to_model(&self, item: &Item, _: &GameData) -> ItemInfo {
        ItemInfo {
            id: item.id,
            name: item.name.clone(),
            name_plural: item.name_plural.clone(),
            portion_name: item.portion_name.clone(),
            portion_name_plural: item.portion_name_plural.clone(),
            pocket: item.pocket,
            price: item.price,
            sell_price: Some(item.sell_price),
            bp_price: item.bp_price,
            field_use: item.field_use,
            battle_use: item.battle_use,
            flags: item.flags.clone(),
            consumable: Some(item.consumable),
            show_quantity: Some(item.show_quantity),
            move_id: item.move_id,
            description: item.description.clone(),
        }
    }

    fn get_property_for_pbs(&self, model: &ItemInfo, key: &str, value: FieldValue) -> Option<FieldValue> {
        let omit = match key {
            "SellPrice" => model.sell_price == Some(model.price / 2),
            "BPPrice" => model.bp_price == 1,
            "FieldUse" => model.field_use == FieldUse::NoFieldUse,
            "BattleUse" => model.battle_use == BattleUse::NoBattleUse,
            "Consumable" => model.consumable != Some(false),
            "ShowQuantity" => model.show_quantity != Some(false),
            _ => false,
        };
        (!omit).then_some(value)
    }
}
