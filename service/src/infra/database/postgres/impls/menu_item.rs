//! [`MenuItem`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Delete, Insert, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{menu_item, MenuItem},
    infra::{database, Database},
    read,
};

use super::Postgres;

impl Database<Select<By<Vec<MenuItem>, read::menu_item::list::Filter>>>
    for Postgres
{
    type Ok = Vec<MenuItem>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<MenuItem>, read::menu_item::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::menu_item::list::Filter { available_only } = by.into_inner();

        const SQL: &str = "\
            SELECT id, name, description, price, image_url, \
                   is_available, has_temperature, sort_order, \
                   created_at \
            FROM menu_items \
            WHERE NOT $1::BOOLEAN OR is_available \
            ORDER BY sort_order ASC, created_at ASC";
        Ok(self
            .query(SQL, &[&available_only])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| MenuItem {
                id: row.get("id"),
                name: row.get("name"),
                description: row.get("description"),
                price: row.get("price"),
                image_url: row.get("image_url"),
                is_available: row.get("is_available"),
                has_temperature: row.get("has_temperature"),
                sort_order: row.get("sort_order"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}

impl<IDs> Database<Select<By<HashMap<menu_item::Id, MenuItem>, IDs>>>
    for Postgres
where
    IDs: AsRef<[menu_item::Id]>,
{
    type Ok = HashMap<menu_item::Id, MenuItem>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<menu_item::Id, MenuItem>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        let ids: &[menu_item::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        const SQL: &str = "\
            SELECT id, name, description, price, image_url, \
                   is_available, has_temperature, sort_order, \
                   created_at \
            FROM menu_items \
            WHERE id = ANY($1::UUID[])";
        Ok(self
            .query(SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                (
                    id,
                    MenuItem {
                        id,
                        name: row.get("name"),
                        description: row.get("description"),
                        price: row.get("price"),
                        image_url: row.get("image_url"),
                        is_available: row.get("is_available"),
                        has_temperature: row.get("has_temperature"),
                        sort_order: row.get("sort_order"),
                        created_at: row.get("created_at"),
                    },
                )
            })
            .collect())
    }
}

impl Database<Select<By<Option<MenuItem>, menu_item::Id>>> for Postgres
where
    Self: Database<
        Select<By<HashMap<menu_item::Id, MenuItem>, [menu_item::Id; 1]>>,
        Ok = HashMap<menu_item::Id, MenuItem>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<MenuItem>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<MenuItem>, menu_item::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl Database<Insert<MenuItem>> for Postgres
where
    Self: Database<Update<MenuItem>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(item): Insert<MenuItem>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(item)).await.map_err(tracerr::wrap!())
    }
}

impl Database<Update<MenuItem>> for Postgres {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(item): Update<MenuItem>,
    ) -> Result<Self::Ok, Self::Err> {
        let MenuItem {
            id,
            name,
            description,
            price,
            image_url,
            is_available,
            has_temperature,
            sort_order,
            created_at,
        } = item;

        const SQL: &str = "\
            INSERT INTO menu_items (\
                id, name, description, price, image_url, \
                is_available, has_temperature, sort_order, \
                created_at \
            ) VALUES (\
                $1::UUID, $2::TEXT, $3::TEXT, $4::INT8, $5::TEXT, \
                $6::BOOLEAN, $7::BOOLEAN, $8::INT4, \
                $9::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                description = EXCLUDED.description, \
                price = EXCLUDED.price, \
                image_url = EXCLUDED.image_url, \
                is_available = EXCLUDED.is_available, \
                has_temperature = EXCLUDED.has_temperature, \
                sort_order = EXCLUDED.sort_order";
        self.exec(
            SQL,
            &[
                &id,
                &name,
                &description,
                &price,
                &image_url,
                &is_available,
                &has_temperature,
                &sort_order,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl Database<Update<menu_item::Availability>> for Postgres {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(availability): Update<menu_item::Availability>,
    ) -> Result<Self::Ok, Self::Err> {
        let menu_item::Availability { id, is_available } = availability;

        const SQL: &str = "\
            UPDATE menu_items \
            SET is_available = $2::BOOLEAN \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id, &is_available])
            .await
            .map_err(tracerr::wrap!())
            .map(|affected| affected > 0)
    }
}

impl Database<Delete<By<MenuItem, menu_item::Id>>> for Postgres {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<MenuItem, menu_item::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM menu_items \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|affected| affected > 0)
    }
}
