use super::ShopData;
use crate::ui::escape;

const SOD: &str = "https://www.thesecretsofdecoupage.com";
const ACS: &str = "https://www.artclipstick.com";

pub fn render(data: &ShopData) -> String {
    let mut html = format!(
        r#"<h2>Shop</h2>
<p>Open our shops (and VIP) in one tap.</p>
<div class="list">
<div class="item"><div class="meta"><div><b>Secrets of Decoupage</b></div><span class="pill">Rice paper</span></div><p>Browse thousands of rice papers and new designs.</p><div class="row"><a class="btn primary" rel="noopener" href="{SOD}">Open shop</a><a class="btn" rel="noopener" href="{SOD}/collections/all">All designs</a></div></div>
<div class="item"><div class="meta"><div><b>ArtClipStick</b></div><span class="pill">Digital</span></div><p>Clipart bundles, stickers and digital downloads.</p><div class="row"><a class="btn primary" rel="noopener" href="{ACS}">Open shop</a><a class="btn" rel="noopener" href="{ACS}/collections/all">All products</a></div></div>
<div class="item"><div class="meta"><div><b>VIP Membership</b></div><span class="pill">VIP</span></div><p>Extra tutorials, tips, and members-only content inside the app.</p><div class="row"><a class="btn primary" rel="noopener" href="{SOD}/products/vip-membership">Become VIP</a><a class="btn" rel="noopener" href="{SOD}/pages/vip">What you get</a></div></div>
</div>
"#
    );

    if !data.products.is_empty() {
        html.push_str(r#"<div id="latest-products"><h3>Latest products (in-app)</h3><div class="list">"#);
        for product in &data.products {
            let image = product
                .image_url
                .as_deref()
                .map(|url| format!(r#"<img src="{}" alt="" style="width:100%;border-radius:12px;">"#, escape(url)))
                .unwrap_or_default();
            html.push_str(&format!(
                r#"<div class="item"><div class="meta"><div><b>{title}</b></div><a class="link" rel="noopener" href="{url}">Open</a></div>{image}</div>"#,
                title = escape(&product.title),
                url = escape(product.url.as_deref().unwrap_or("#")),
            ));
        }
        html.push_str("</div></div>\n");
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StoreProduct;

    #[test]
    fn static_links_always_render() {
        let html = render(&ShopData::default());
        assert!(html.contains("https://www.artclipstick.com/collections/all"));
        assert!(html.contains("/products/vip-membership"));
        assert!(!html.contains("latest-products"));
    }

    #[test]
    fn storefront_products_are_listed() {
        let data = ShopData {
            products: vec![StoreProduct {
                title: "Rose <A4>".into(),
                url: None,
                image_url: Some("https://img/rose.jpg".into()),
            }],
        };
        let html = render(&data);
        assert!(html.contains("Rose &lt;A4&gt;"));
        assert!(html.contains(r##"href="#""##));
        assert!(html.contains("https://img/rose.jpg"));
    }
}
