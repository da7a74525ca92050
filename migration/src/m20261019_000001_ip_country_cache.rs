use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 ip_country_cache 表
        manager
            .create_table(
                Table::create()
                    .table(IpCountryCache::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IpCountryCache::Ip)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(IpCountryCache::Country)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(IpCountryCache::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 过期清理按 expires_at 扫描
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ip_country_cache_expires_at")
                    .table(IpCountryCache::Table)
                    .col(IpCountryCache::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_ip_country_cache_expires_at")
                    .table(IpCountryCache::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(IpCountryCache::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum IpCountryCache {
    #[sea_orm(iden = "ip_country_cache")]
    Table,
    Ip,
    Country,
    ExpiresAt,
}
