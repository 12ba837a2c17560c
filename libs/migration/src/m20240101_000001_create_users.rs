use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_len(Users::Name, 50))
                    .col(integer(Users::Age))
                    .col(json_binary(Users::Md).default(Expr::cust("'{}'::jsonb")))
                    .col(string_len_uniq(Users::Email, 50))
                    .col(
                        timestamp_with_time_zone(Users::CreatedDate)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Users::ModifyDate)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // modify_date follows every UPDATE, including ones issued outside the app
        let conn = manager.get_connection();
        conn.execute_unprepared(
            r#"
            CREATE OR REPLACE FUNCTION users_touch_modify_date()
            RETURNS TRIGGER AS $$
            BEGIN
                NEW.modify_date = now();
                RETURN NEW;
            END;
            $$ LANGUAGE plpgsql
            "#,
        )
        .await?;

        conn.execute_unprepared(
            r#"
            CREATE TRIGGER users_touch_modify_date
                BEFORE UPDATE ON users
                FOR EACH ROW
                EXECUTE FUNCTION users_touch_modify_date()
            "#,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();
        conn.execute_unprepared("DROP TRIGGER IF EXISTS users_touch_modify_date ON users")
            .await?;
        conn.execute_unprepared("DROP FUNCTION IF EXISTS users_touch_modify_date()")
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    Age,
    Md,
    Email,
    CreatedDate,
    ModifyDate,
}
