//! [`Order`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Insert, Select, Update};
use postgres_types::Json;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        order::{self, Line},
        Order,
    },
    infra::{database, postgres, Database},
    read,
};

use super::Postgres;

const UPSERT_ORDER_SQL: &str = "\
    INSERT INTO orders (\
        id, order_number, customer_name, customer_email, customer_phone, \
        customer_messaging_id, status, total_amount, notes, pickup_time, \
        payment_session_id, created_at, updated_at \
    ) VALUES (\
        $1::UUID, $2::TEXT, $3::TEXT, $4::TEXT, $5::TEXT, \
        $6::TEXT, $7::INT2, $8::INT8, $9::TEXT, $10::TIMESTAMPTZ, \
        $11::TEXT, $12::TIMESTAMPTZ, $13::TIMESTAMPTZ \
    ) \
    ON CONFLICT (id) DO UPDATE \
    SET customer_messaging_id = EXCLUDED.customer_messaging_id, \
        status = EXCLUDED.status, \
        payment_session_id = EXCLUDED.payment_session_id, \
        updated_at = EXCLUDED.updated_at";

const INSERT_LINE_SQL: &str = "\
    INSERT INTO order_items (\
        id, order_id, menu_item_id, menu_item_name, quantity, \
        unit_price, temperature, options, created_at \
    ) VALUES (\
        $1::UUID, $2::UUID, $3::UUID, $4::TEXT, $5::INT4, \
        $6::INT8, $7::INT2, $8::JSONB, $9::TIMESTAMPTZ \
    )";

impl Database<Insert<read::order::WithLines>> for Postgres {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(with_lines): Insert<read::order::WithLines>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::order::WithLines { order, lines } = with_lines;
        let Order {
            id,
            number,
            customer_name,
            customer_email,
            customer_phone,
            customer_messaging_id,
            status,
            total_amount,
            notes,
            pickup_time,
            payment_session_id,
            created_at,
            updated_at,
        } = order;

        let mut conn = self.connection().await.map_err(tracerr::wrap!())?;
        let tx = conn
            .transaction()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)?;

        _ = tx
            .execute(
                UPSERT_ORDER_SQL,
                &[
                    &id,
                    &number,
                    &customer_name,
                    &customer_email,
                    &customer_phone,
                    &customer_messaging_id,
                    &status,
                    &total_amount,
                    &notes,
                    &pickup_time,
                    &payment_session_id,
                    &created_at,
                    &updated_at,
                ],
            )
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)?;

        for line in lines {
            let Line {
                id,
                order_id,
                menu_item_id,
                menu_item_name,
                quantity,
                unit_price,
                temperature,
                options,
                created_at,
            } = line;

            _ = tx
                .execute(
                    INSERT_LINE_SQL,
                    &[
                        &id,
                        &order_id,
                        &menu_item_id,
                        &menu_item_name,
                        &quantity,
                        &unit_price,
                        &temperature,
                        &Json(&options),
                        &created_at,
                    ],
                )
                .await
                .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                .map_err(tracerr::map_from)?;
        }

        tx.commit()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

impl Database<Update<Order>> for Postgres {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(order): Update<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        let Order {
            id,
            number,
            customer_name,
            customer_email,
            customer_phone,
            customer_messaging_id,
            status,
            total_amount,
            notes,
            pickup_time,
            payment_session_id,
            created_at,
            updated_at,
        } = order;

        self.exec(
            UPSERT_ORDER_SQL,
            &[
                &id,
                &number,
                &customer_name,
                &customer_email,
                &customer_phone,
                &customer_messaging_id,
                &status,
                &total_amount,
                &notes,
                &pickup_time,
                &payment_session_id,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl Database<Select<By<Option<Order>, order::Id>>> for Postgres {
    type Ok = Option<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Order>, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, order_number, customer_name, customer_email, \
                   customer_phone, customer_messaging_id, status, \
                   total_amount, notes, pickup_time, payment_session_id, \
                   created_at, updated_at \
            FROM orders \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| order_from_row(&row)))
    }
}

impl Database<Select<By<Option<read::order::WithLines>, order::Id>>>
    for Postgres
where
    Self: Database<
        Select<By<Option<Order>, order::Id>>,
        Ok = Option<Order>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<read::order::WithLines>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<read::order::WithLines>, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let Some(order) = self
            .execute(Select(By::<Option<Order>, _>::new(id)))
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        let mut lines = self
            .lines_of(&[id])
            .await
            .map_err(tracerr::wrap!())?;
        Ok(Some(read::order::WithLines {
            order,
            lines: lines.remove(&id).unwrap_or_default(),
        }))
    }
}

impl Database<Select<By<Vec<read::order::WithLines>, read::order::list::Today>>>
    for Postgres
{
    type Ok = Vec<read::order::WithLines>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(_): Select<
            By<Vec<read::order::WithLines>, read::order::list::Today>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT id, order_number, customer_name, customer_email, \
                   customer_phone, customer_messaging_id, status, \
                   total_amount, notes, pickup_time, payment_session_id, \
                   created_at, updated_at \
            FROM orders \
            WHERE created_at >= CURRENT_DATE \
            ORDER BY created_at DESC";
        let orders = self
            .query(SQL, &[])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(order_from_row)
            .collect::<Vec<_>>();

        let ids = orders.iter().map(|o| o.id).collect::<Vec<_>>();
        let mut lines = self
            .lines_of(&ids)
            .await
            .map_err(tracerr::wrap!())?;
        Ok(orders
            .into_iter()
            .map(|order| {
                let lines = lines.remove(&order.id).unwrap_or_default();
                read::order::WithLines { order, lines }
            })
            .collect())
    }
}

impl Postgres {
    /// Fetches all the [`Line`]s of the [`Order`]s with the provided IDs,
    /// grouped by [`order::Id`].
    async fn lines_of(
        &self,
        ids: &[order::Id],
    ) -> Result<HashMap<order::Id, Vec<Line>>, Traced<database::Error>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        const SQL: &str = "\
            SELECT id, order_id, menu_item_id, menu_item_name, quantity, \
                   unit_price, temperature, options, created_at \
            FROM order_items \
            WHERE order_id = ANY($1::UUID[]) \
            ORDER BY created_at ASC";
        let mut grouped = HashMap::<order::Id, Vec<Line>>::new();
        for row in self
            .query(SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
        {
            let Json(options) =
                row.get::<_, Json<Vec<order::line::SelectedOption>>>(
                    "options",
                );
            let line = Line {
                id: row.get("id"),
                order_id: row.get("order_id"),
                menu_item_id: row.get("menu_item_id"),
                menu_item_name: row.get("menu_item_name"),
                quantity: row.get("quantity"),
                unit_price: row.get("unit_price"),
                temperature: row.get("temperature"),
                options,
                created_at: row.get("created_at"),
            };
            grouped.entry(line.order_id).or_default().push(line);
        }
        Ok(grouped)
    }
}

/// Constructs an [`Order`] out of the provided [`Row`].
fn order_from_row(row: &Row) -> Order {
    Order {
        id: row.get("id"),
        number: row.get("order_number"),
        customer_name: row.get("customer_name"),
        customer_email: row.get("customer_email"),
        customer_phone: row.get("customer_phone"),
        customer_messaging_id: row.get("customer_messaging_id"),
        status: row.get("status"),
        total_amount: row.get("total_amount"),
        notes: row.get("notes"),
        pickup_time: row.get("pickup_time"),
        payment_session_id: row.get("payment_session_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
