mod account;
mod community;
mod home;
mod shop;
mod tips;

use crate::models::{Comment, Post, RedeemedCode, StoreProduct, Tip};
use crate::state::{Focus, Tab, ViewState};

pub type Section<T> = Result<T, String>;

/// The remote snapshot one render pass fetched for its tab.
#[derive(Debug, Clone)]
pub enum TabData {
    Home(HomeData),
    Tips(TipsData),
    Community(CommunityData),
    Shop(ShopData),
    Account(AccountData),
}

impl TabData {
    pub fn tab(&self) -> Tab {
        match self {
            TabData::Home(_) => Tab::Home,
            TabData::Tips(_) => Tab::Tips,
            TabData::Community(_) => Tab::Community,
            TabData::Shop(_) => Tab::Shop,
            TabData::Account(_) => Tab::Account,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HomeData {
    pub tips: Section<Vec<Tip>>,
    pub posts: Section<Vec<Post>>,
    pub tip_of_day: Option<Tip>,
}

#[derive(Debug, Clone)]
pub struct TipsData {
    pub tips: Section<Vec<Tip>>,
}

#[derive(Debug, Clone)]
pub struct CommunityData {
    pub posts: Section<Vec<Post>>,
    pub comments: Option<(String, Section<Vec<Comment>>)>,
}

#[derive(Debug, Clone, Default)]
pub struct ShopData {
    pub products: Vec<StoreProduct>,
}

#[derive(Debug, Clone, Default)]
pub struct AccountData {
    pub api_url: String,
    pub shop_domain: String,
    pub shop_token: String,
}

/// One-shot values taken out of the state for exactly one render.
#[derive(Debug, Clone, Default)]
pub struct Flash {
    pub focus: Option<Focus>,
    pub redeemed: Option<RedeemedCode>,
}

pub fn render(view: &ViewState, data: &TabData, flash: &Flash) -> String {
    match data {
        TabData::Home(data) => home::render(view, data),
        TabData::Tips(data) => tips::render(view, data, flash.focus.as_ref()),
        TabData::Community(data) => community::render(view, data, flash.focus.as_ref()),
        TabData::Shop(data) => shop::render(data),
        TabData::Account(data) => account::render(view, data, flash.redeemed.as_ref()),
    }
}
